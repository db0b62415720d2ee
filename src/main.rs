use clap::Parser;
use std::process::ExitCode;

use modext::args::{Args, Command};
use modext::config::AppConfig;
use modext::errors::AppError;
use modext::handlers::extend::{handle_extend_class, handle_extend_service};
use modext::handlers::inspect::{handle_locate, handle_show};
use modext::logging::{init_logging, LoggingConfig};

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = init_logging(LoggingConfig::for_verbosity(args.verbose)) {
        eprintln!("无法初始化日志: {}", e);
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let kind = match e.downcast_ref::<AppError>() {
                Some(AppError::Generator(err)) => err.kind(),
                Some(AppError::Config(_)) => "config",
                _ => "other",
            };
            tracing::error!(error = %e, kind, "命令执行失败");
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let config = AppConfig::load(args.config, args.root).map_err(AppError::from)?;
    tracing::debug!(root = %config.application.root.display(), source = ?config.source, "配置已加载");

    match &args.command {
        Command::ExtendService { path, module } => handle_extend_service(&config, path, module)?,
        Command::ExtendClass { class, module } => handle_extend_class(&config, class, module)?,
        Command::Locate { class } => handle_locate(&config, class)?,
        Command::Show { path } => handle_show(&config, path.as_deref())?,
    }

    Ok(())
}
