use std::process::ExitCode;

use tracing::info;

use tes_core::{
    app,
    cli::{self, Command},
    config::Config,
    progress::Progress,
};
use tes_telegram::TelegramClient;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cfg = Config::load();

    let opts = match cli::parse_args(std::env::args().skip(1), &cfg) {
        Ok(Command::Help) => {
            print!("{}", cli::help_message(&cfg));
            return ExitCode::SUCCESS;
        }
        Ok(Command::Export(opts)) => opts,
        Err(e) => {
            eprintln!("{}: {e}", cfg.program_name);
            eprintln!("Try '{} --help' for more information.", cfg.program_name);
            return ExitCode::from(2);
        }
    };

    if let Err(e) = tes_core::logging::init(&cfg.program_name) {
        return fail(&e);
    }

    let client =
        match TelegramClient::sign_in(&cfg, opts.app_id, &opts.app_hash, opts.save_session).await
        {
            Ok(c) => c,
            Err(e) => return fail(&e),
        };

    let result = app::run(&client, &cfg, &opts, &mut Progress::stdout()).await;
    if let Err(e) = client.save_session() {
        tracing::warn!(error = %e, "failed to save session");
    }

    match result {
        Ok(summary) => {
            info!(
                sets = summary.sets,
                downloaded = summary.downloaded,
                skipped = summary.skipped,
                failed = summary.failed,
                "export finished"
            );
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn fail(e: &tes_core::Error) -> ExitCode {
    eprintln!("Error: {e}");
    ExitCode::FAILURE
}
