use std::{process, sync::Arc};

use serde::Serialize;
use serde_json::Value;
use tessera::{
    application::{
        error::AppError,
        page::PageAssembler,
        repos::{PagesRepo, SettingsRepo},
        settings::ModuleSettingsCache,
        spam::{CommentKind, SpamCandidate, SpamCheckService, SpamClassifier},
    },
    config::{self, SettingCommand},
    infra::{akismet::AkismetClient, db::StoreAccessor, error::InfraError, telemetry},
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(error.exit_code());
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(std::io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli().map_err(|err| {
        AppError::from(InfraError::configuration(format!(
            "failed to load configuration: {err}"
        )))
    })?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    let store = StoreAccessor::new(&settings.database)?;

    match cli_args.command {
        config::Command::Setting(args) => {
            let cache = settings_cache(&store).await?;
            match args.command {
                SettingCommand::Get(get) => {
                    let default = parse_json("--default", &get.default)?;
                    let value = cache.get_setting(&get.module, &get.name, default).await?;
                    print_json(&value)
                }
                SettingCommand::Set(set) => {
                    let value = parse_json("value", &set.value)?;
                    cache.set_setting(&set.module, &set.name, value).await?;
                    info!(module = %set.module, name = %set.name, "setting stored");
                    Ok(())
                }
            }
        }
        config::Command::Settings(args) => {
            let cache = settings_cache(&store).await?;
            let module = cache.get_module_settings(&args.module).await?;
            print_json(&module)
        }
        config::Command::Page(args) => {
            let pages: Arc<dyn PagesRepo> = Arc::new(store.reader().await?.clone());
            let assembler = PageAssembler::new(pages, settings.site.language.clone());
            let page = assembler
                .get_page_by_raw_id(&args.id)
                .await?
                .ok_or(AppError::NotFound)?;
            print_json(&page)
        }
        config::Command::SpamCheck(args) => {
            let cache = settings_cache(&store).await?;
            let classifier: Arc<dyn SpamClassifier> = Arc::new(AkismetClient::new(
                settings.spam.endpoint.as_str(),
                settings.site.url.as_str(),
                settings.spam.timeout,
            )?);
            let service = SpamCheckService::new(cache, classifier, settings.site.debug);

            let kind = args
                .kind
                .parse::<CommentKind>()
                .unwrap_or_else(|never| match never {});
            let candidate = SpamCandidate {
                content: args.content,
                permalink: args.permalink,
                author: args.author,
                email: args.email,
                url: args.url,
                kind,
                user_ip: args.user_ip,
                user_agent: args.user_agent,
            };

            let spam = service.is_spam(&candidate).await?;
            print_json(&serde_json::json!({ "spam": spam }))
        }
    }
}

async fn settings_cache(store: &StoreAccessor) -> Result<ModuleSettingsCache, AppError> {
    let repo: Arc<dyn SettingsRepo> = Arc::new(store.writer().await?.clone());
    Ok(ModuleSettingsCache::new(repo))
}

fn parse_json(field: &str, raw: &str) -> Result<Value, AppError> {
    serde_json::from_str(raw)
        .map_err(|err| AppError::validation(format!("{field} is not valid JSON: {err}")))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::unexpected(format!("failed to render output: {err}")))?;
    println!("{rendered}");
    Ok(())
}
