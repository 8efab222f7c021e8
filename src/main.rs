use std::sync::Arc;

use clap::Parser;
use log::{error, info};
use serde::Serialize;

use captivate::configuration::Setting;
use captivate::host::ScriptedHost;
use captivate::message::{Body, Header, Message};
use captivate::service::{AdapterMode, AdapterService};
use captivate::session_management::Verdict;
use captivate::storage::MemorySessionStore;

#[derive(Parser)]
#[command(name = "captivate-probe")]
#[command(version)]
#[command(about = "Runs requests through the captive portal adapter and prints what the host would send")]
struct Args {
    /// Configuration file with the session store parameters
    #[arg(short, long, env = "CAPTIVATE_CONFIG")]
    config: Option<String>,

    /// Address of the simulated client
    #[arg(long, default_value = "10.0.0.5")]
    client_ip: String,

    /// Number of consecutive requests from the client
    #[arg(short = 'n', long, default_value_t = 1)]
    requests: u32,

    /// Keep sessions in memory instead of the configured database
    #[arg(long)]
    memory: bool,

    /// Run the pass-through adapter instead of the captive portal
    #[arg(long)]
    minimal: bool,

    /// Simulate a response without a body
    #[arg(long)]
    no_body: bool,

    /// URI the host reports in the marker header
    #[arg(long, default_value = "ecap://captivate-probe")]
    host_uri: String,

    /// Print one JSON object per request
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Report {
    request: u32,
    client_ip: String,
    verdict: Option<Verdict>,
    counter: Option<i64>,
    message: Option<Message>,
    body: String,
}

fn virgin_response(with_body: bool) -> Message {
    let content = "probe origin content";
    let header: Header = [
        ("Content-Type", "text/plain".to_string()),
        ("Content-Length", content.len().to_string()),
        ("Accept-Encoding", "gzip".to_string()),
    ]
    .into_iter()
    .collect();
    let body = with_body.then_some(Body {
        size: Some(content.len() as u64),
    });
    Message::new("HTTP/1.1 200 OK", header, body)
}

fn run_request(service: &AdapterService, args: &Args, request: u32) -> Result<Report, String> {
    let host = ScriptedHost::new(virgin_response(!args.no_body)).with_client_ip(&args.client_ip);
    let mut xaction = service
        .make_transaction(Box::new(host.clone()))
        .map_err(|e| e.to_string())?;

    xaction.start();
    let mut body = String::new();
    if xaction.callable() {
        xaction.ab_make();
        host.feed(b"probe origin content");
        xaction.note_vb_content_available();
        xaction.note_vb_content_done(true);
        let content = xaction.ab_content(0, usize::MAX).to_vec();
        xaction.ab_content_shift(content.len());
        body = String::from_utf8_lossy(&content).into_owned();
    }
    let report = Report {
        request,
        client_ip: args.client_ip.clone(),
        verdict: xaction.verdict(),
        counter: xaction.admission().map(|a| a.counter),
        message: host.adapted(),
        body,
    };
    xaction.stop();
    Ok(report)
}

fn print_report(report: &Report) {
    println!("request #{} from {}", report.request, report.client_ip);
    match (report.verdict, report.counter) {
        (Some(verdict), Some(counter)) => println!("  verdict: {:?} (counter {})", verdict, counter),
        (Some(verdict), None) => println!("  verdict: {:?}", verdict),
        _ => println!("  virgin message passed through"),
    }
    if let Some(message) = &report.message {
        println!("  {}", message.first_line);
        for (name, value) in message.header.iter() {
            println!("  {}: {}", name, value);
        }
    }
    if !report.body.is_empty() {
        println!("  {}", report.body);
    }
}

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .init();

    let args = Args::parse();

    let mode = if args.minimal {
        AdapterMode::Minimal
    } else {
        AdapterMode::Captivating
    };
    let mut service = AdapterService::new(mode, args.host_uri.clone());
    if args.memory {
        service = service.with_store(Arc::new(MemorySessionStore::new()));
    }
    info!("{}", service.describe());

    let settings: Vec<Setting> = args
        .config
        .iter()
        .map(|path| Setting::new("config", path.as_str()))
        .collect();
    if let Err(e) = service.configure(&settings) {
        error!("Unable to configure the adapter: {}", e);
        std::process::exit(1);
    }
    if let Err(e) = service.start() {
        error!("Unable to start the adapter: {}", e);
        std::process::exit(1);
    }

    for request in 1..=args.requests {
        let report = match run_request(&service, &args, request) {
            Ok(report) => report,
            Err(e) => {
                error!("Request #{} failed: {}", request, e);
                std::process::exit(1);
            }
        };
        if args.json {
            match serde_json::to_string(&report) {
                Ok(line) => println!("{}", line),
                Err(e) => error!("Unable to serialize report: {}", e),
            }
        } else {
            print_report(&report);
        }
    }

    service.stop();
    service.retire();
}
