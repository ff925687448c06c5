//! Debattle CLI
//!
//! Usage:
//!   debattle --serve                              # HTTP/WS API + phase scheduler
//!   debattle --judge round.txt --topic "..."      # Judge a formatted transcript
//!   debattle --judge round.txt --topic "..." --json
//!   debattle --demo                               # Fast-forwarded single-speaker debate

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use colored::Colorize;

use debattle::core::{
    arbiter, engine, ingest, run_server, CommandTranscriber, DebateService, InterruptionAskSubmission,
    Judge, JudgeService, MemoryStore, ProcessJudge, RoutingTranscriber, SpeechSubmission,
    TextTranscriber,
};
use debattle::logging::{init_logging, LogFormat};
use debattle::types::{
    DebateConfig, Judgment, Phase, SessionState, SideJudgment, StateSnapshot, Team, Verdict,
};
use debattle::VERSION;

#[derive(Parser, Debug)]
#[command(
    name = "debattle",
    version = VERSION,
    about = "Debattle - timed two-team debate engine",
    long_about = "Debattle runs timed debates between an affirmative (A) and a negative (B) team.\n\n\
                  Modes:\n  \
                  --serve   HTTP + WebSocket API with the one-second phase scheduler\n  \
                  --judge   Judge a transcript file ([mm:ss AFF-1] text lines)\n  \
                  --demo    Fast-forwarded single-speaker debate on text handles\n\n\
                  Phases:\n  \
                  LOBBY > TEAM_DISCUSS > SPEECH_A/SPEECH_B (x team size)\n  \
                  > CONCLUSION_A > CONCLUSION_B > JUDGING > COMPLETE"
)]
struct Args {
    /// Run as HTTP API server
    #[arg(short, long)]
    serve: bool,

    /// Server address
    #[arg(long, default_value = "127.0.0.1:3000", env = "DEBATTLE_ADDR")]
    addr: String,

    /// Scheduler tick period in milliseconds
    #[arg(long, default_value_t = 1000, env = "DEBATTLE_TICK_MS")]
    tick_ms: u64,

    /// External judge command (transcript on stdin, JSON verdict on stdout)
    #[arg(long, env = "DEBATTLE_JUDGE_CMD")]
    judge_cmd: Option<String>,

    /// Speech-to-text command (`{}` marks the audio handle, else appended; JSON on stdout)
    #[arg(long, env = "DEBATTLE_STT_CMD")]
    stt_cmd: Option<String>,

    /// Judge a transcript file
    #[arg(short, long, value_name = "FILE")]
    judge: Option<PathBuf>,

    /// Debate topic (for --judge and --demo)
    #[arg(short, long)]
    topic: Option<String>,

    /// Fast-forwarded demo debate
    #[arg(long)]
    demo: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Human)]
    log_format: LogFormat,
}

const DEMO_TOPIC: &str = "Social media should be banned for under-16s";

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.log_format, args.verbose);
    if args.no_color {
        colored::control::set_override(false);
    }

    let result = if args.serve {
        run_serve(&args).await
    } else if let Some(path) = &args.judge {
        run_judge(path, &args).await
    } else if args.demo {
        run_demo(&args).await
    } else {
        Err("nothing to do: pass --serve, --judge <FILE> or --demo (see --help)".into())
    };

    if let Err(e) = result {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn judge_service(args: &Args) -> JudgeService {
    let external = args
        .judge_cmd
        .as_deref()
        .and_then(ProcessJudge::from_command_line)
        .map(|judge| Arc::new(judge) as Arc<dyn Judge>);
    JudgeService::new(external)
}

/// Run HTTP API server
async fn run_serve(args: &Args) -> CliResult {
    let backend = args.stt_cmd.as_deref().and_then(CommandTranscriber::from_command_line);
    let service = DebateService::new(
        MemoryStore::new().shared(),
        Arc::new(RoutingTranscriber::new(backend)),
        judge_service(args),
    );

    print_header("API Server");
    println!("  listening on {}", args.addr.bold());
    println!("  tick period  {} ms", args.tick_ms);
    println!();

    run_server(&args.addr, service, Duration::from_millis(args.tick_ms)).await
}

/// Judge a transcript file
async fn run_judge(path: &Path, args: &Args) -> CliResult {
    let topic = args.topic.as_deref().ok_or("--judge needs --topic")?;
    let transcript = tokio::fs::read_to_string(path).await?;
    let verdict = judge_service(args).judge_transcript(topic, &transcript).await;
    print_verdict(&verdict, args.json)
}

/// Scripted lines for the demo, per speaking phase
fn demo_script(phase: Phase) -> Option<&'static str> {
    match phase {
        Phase::SpeechA => Some(
            "The issue is whether social media should be banned for under-16s. \
             According to the 2023 Online Safety Act, platforms already owe children a duty of care. \
             Therefore we conclude a ban is the only rule that applies cleanly.",
        ),
        Phase::SpeechB => Some(
            "A ban is unenforceable and pushes teenagers onto worse platforms. \
             Education works better than prohibition. \
             Would my opponents also ban libraries?",
        ),
        Phase::ConclusionA => Some(
            "Thus the duty of care the Act creates is best met by a clear age limit.",
        ),
        Phase::ConclusionB => Some("Teach, do not ban."),
        _ => None,
    }
}

/// Fast-forwarded single-speaker debate
async fn run_demo(args: &Args) -> CliResult {
    let topic = args.topic.clone().unwrap_or_else(|| DEMO_TOPIC.to_string());
    let config = DebateConfig::new("demo", topic, 1)
        .with_timings(3, 30, 10, 4)
        .with_interruptions(1, 5);
    let mut session = SessionState::new(config, Vec::new())?;
    let transcriber = TextTranscriber::new();

    if !args.json {
        print_header("Demo");
        println!("  topic: {}", session.config.topic.italic());
        println!();
    }

    let mut shown = session.phase;
    engine::start(&mut session)?;
    let mut interrupted = false;

    while session.phase != Phase::Judging {
        if session.phase != shown {
            shown = session.phase;
            if !args.json {
                print_snapshot(&StateSnapshot::of(&session), args.no_color);
            }
            if let (Some(text), Some(team)) = (demo_script(shown), shown.team()) {
                let submission = SpeechSubmission {
                    team,
                    phase: shown,
                    source: format!("text:{}", text),
                    speaker_id: None,
                };
                ingest::submit_speech(&mut session, submission, &transcriber).await?;
            }
        }

        // B interrupts A's speech once, early on
        if session.phase == Phase::SpeechA && !interrupted && arbiter::can_interrupt(&session, Team::B) {
            interrupted = true;
            arbiter::start_interruption_ask(&mut session, Team::B)?;
            let ask = InterruptionAskSubmission {
                team: Team::B,
                source: "text:Who enforces the age check?".to_string(),
            };
            ingest::submit_interruption_ask(&mut session, ask, &transcriber).await?;
            if !args.json {
                println!("  {} B asks: Who enforces the age check?", "⚡".yellow());
            }
            arbiter::end_interruption_ask(&mut session)?;
            shown = session.phase;
        }

        engine::tick(&mut session);
    }

    let verdict = judge_service(args).judge_session(&session).await;
    engine::finish(&mut session)?;
    if !args.json {
        print_snapshot(&StateSnapshot::of(&session), args.no_color);
        println!();
    }
    print_verdict(&verdict, args.json)
}

/// Print header
fn print_header(mode: &str) {
    println!("{}", "========================================".bold());
    println!("  {}", format!("Debattle v{} - {}", VERSION, mode).bold());
    println!("{}", "========================================".bold());
    println!();
}

fn print_snapshot(snapshot: &StateSnapshot, no_color: bool) {
    if no_color {
        println!("{}", snapshot.to_parseable_string());
    } else {
        println!("{}", snapshot.to_terminal_string());
    }
}

fn print_verdict(verdict: &Verdict, json: bool) -> CliResult {
    if json {
        println!("{}", serde_json::to_string_pretty(verdict)?);
        return Ok(());
    }
    match verdict {
        Verdict::Heuristic(judgment) => print_judgment(judgment),
        Verdict::External(external) => {
            println!("{} {}", "Winner:".bold(), external.winner.to_string().green().bold());
            println!("  AFF {:.1} / NEG {:.1}", external.affirmative, external.negative);
            if !external.summary.is_empty() {
                println!("  {}", external.summary);
            }
        }
    }
    Ok(())
}

fn print_judgment(judgment: &Judgment) {
    print_side(&judgment.sides.a);
    print_side(&judgment.sides.b);
    println!("{}", judgment.final_statement.green().bold());
}

fn print_side(side: &SideJudgment) {
    let s = &side.scores;
    println!(
        "{} clarity={:.1} relevance={:.1} evidence={:.1} irac={:.1} civility={:.1} | total={:.1} (/100: {})",
        side.team.side_label().bold(),
        s.clarity,
        s.relevance,
        s.evidence,
        s.irac,
        s.civility,
        side.total,
        side.scaled
    );
    for bullet in &side.feedback {
        println!("  {} {}", "-".dimmed(), bullet);
    }
}
