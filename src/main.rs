use clap::Parser;
use project_dashboard::command::{self, Command};
use project_dashboard::config::DashboardArgs;
use project_dashboard::render;
use project_dashboard::{HttpGateway, Synchronizer};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = DashboardArgs::parse();

    let gateway = HttpGateway::new(args.gateway_url.clone(), args.request_timeout())?;
    let synchronizer = Synchronizer::new(Arc::new(gateway), args.sync_config());
    println!("Loading report from {}", args.gateway_url);
    let session = synchronizer.load().await;
    let status_rx = session.status();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut status = String::from("ok");
    let mut show = true;
    loop {
        if show {
            print!("{}", render::render_report(&session.snapshot()));
        }
        show = false;

        let indicator = render::save_indicator(&status_rx.borrow());
        print!("({status}) {indicator} > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match command::parse(&line) {
            Ok(Command::Quit) => break,
            Ok(Command::Show) => {
                show = true;
                status = String::from("ok");
            }
            Ok(Command::Help) => {
                println!("{}", command::HELP);
                status = String::from("ok");
            }
            Ok(Command::Status) => {
                let current = status_rx.borrow().clone();
                println!(
                    "lifecycle: {:?}, load: {:?}, pending: {}, saving: {}",
                    current.lifecycle,
                    current.load_outcome,
                    current.pending,
                    current.saving()
                );
                if let Some(at) = current.last_attempt_at {
                    println!("last save attempt: {at}");
                }
                status = String::from("ok");
            }
            Ok(Command::Flush) => {
                status = match session.flush().await {
                    Ok(()) => String::from("saved"),
                    Err(e) => format!("save failed: {e}"),
                };
            }
            Ok(Command::Apply(edit)) => {
                status = match session.apply(edit) {
                    Ok(_) => String::from("ok"),
                    Err(e) => e.to_string(),
                };
            }
            Err(message) => status = message,
        }
    }

    // unsaved edits are written before exit rather than dropped with the timer
    let unsettled = {
        let current = status_rx.borrow();
        current.pending || current.saving()
    };
    if unsettled {
        if let Err(e) = session.flush().await {
            eprintln!("final save failed: {e}");
        }
    }
    session.close();

    Ok(())
}
