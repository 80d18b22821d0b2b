use std::error::Error;
use std::sync::Arc;

use message_translator_lib::api::commands::{dispatch, resolve_target_language, Intent, IntentOutcome};
use message_translator_lib::shared::types::{Message, MessageId, TargetLanguage};
use message_translator_lib::shared::PipelineResult;
use message_translator_lib::{
    init_tracing, EventBus, HttpLanguageProvider, LanguageServiceClient, Pipeline, PipelineSettings,
};
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
Type a message to submit it. Commands:
  /to <code>          select target language (en, pt, es, ru, tr, fr)
  /translate <n>      translate message n into the selected language
  /summarize <n>      summarize message n
  /clear <n> [code]   remove one translation (or all) from message n
  /delete <n>         delete message n
  /list               show all messages
  /quit";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    // `stored` is what goes back to disk; env overrides only apply to this run
    let mut stored = PipelineSettings::load().await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load settings, using defaults");
        PipelineSettings::default()
    });
    let settings = stored.clone().with_env_overrides();

    let provider = HttpLanguageProvider::new(&settings.provider, PipelineSettings::summarizer_api_key())?;
    let client = LanguageServiceClient::new(Arc::new(provider));
    let pipeline = Pipeline::new(client, settings.preferences.clone(), EventBus::new());

    let capability = pipeline.probe().await;
    tracing::info!(?capability, target_lang = pipeline.target_language().code(), "pipeline ready");
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line == "/quit" {
            break;
        }
        match parse_line(&pipeline, line) {
            Ok(Some(intent)) if calls_service(&intent) => spawn_intent(&pipeline, intent),
            Ok(Some(intent)) => {
                let outcome = dispatch(&pipeline, intent).await;
                if let Ok(IntentOutcome::TargetLanguageSet { language }) = &outcome {
                    remember_target_language(&mut stored, *language, &pipeline).await;
                }
                report(&pipeline, outcome);
            }
            Ok(None) => print_messages(&pipeline.snapshot().messages),
            Err(reason) => println!("! {}", reason),
        }
    }

    Ok(())
}

/// Translate one input line into an intent. `Ok(None)` means "list".
fn parse_line(pipeline: &Pipeline, line: &str) -> Result<Option<Intent>, String> {
    let Some(command) = line.strip_prefix('/') else {
        return Ok(Some(Intent::Submit { text: line.to_string() }));
    };
    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or("");
    let arg = parts.next();

    let intent = match name {
        "list" => return Ok(None),
        "to" => Intent::SetTargetLanguage {
            language: arg.ok_or("usage: /to <code>")?.to_string(),
        },
        "translate" => Intent::TranslateTo {
            id: message_at(pipeline, arg)?,
            language: pipeline.target_language(),
        },
        "summarize" => Intent::Summarize { id: message_at(pipeline, arg)? },
        "delete" => Intent::Delete { id: message_at(pipeline, arg)? },
        "clear" => {
            let id = message_at(pipeline, arg)?;
            let language = parts
                .next()
                .map(resolve_target_language)
                .transpose()
                .map_err(|e| e.to_string())?;
            Intent::ClearTranslation { id, language }
        }
        _ => return Err(format!("unknown command /{}\n{}", name, HELP)),
    };
    Ok(Some(intent))
}

/// 1-based position in the newest-first list
fn message_at(pipeline: &Pipeline, arg: Option<&str>) -> Result<MessageId, String> {
    let index: usize = arg
        .ok_or("missing message number")?
        .parse()
        .map_err(|_| "message number must be a positive integer".to_string())?;
    let messages = pipeline.snapshot().messages;
    index
        .checked_sub(1)
        .and_then(|i| messages.get(i))
        .map(|m| m.id)
        .ok_or_else(|| format!("no message #{}", index))
}

fn calls_service(intent: &Intent) -> bool {
    matches!(
        intent,
        Intent::Submit { .. } | Intent::Translate { .. } | Intent::TranslateTo { .. } | Intent::Summarize { .. }
    )
}

/// Service calls run as tasks so the prompt stays responsive; results are
/// printed when they land. Everything else is dispatched inline, in input
/// order.
fn spawn_intent(pipeline: &Pipeline, intent: Intent) {
    let pipeline = pipeline.clone();
    tokio::spawn(async move {
        let outcome = dispatch(&pipeline, intent).await;
        report(&pipeline, outcome);
    });
}

async fn remember_target_language(stored: &mut PipelineSettings, language: TargetLanguage, pipeline: &Pipeline) {
    if stored.preferences.default_target_lang == language {
        return;
    }
    stored.preferences.default_target_lang = language;
    if let Err(e) = stored.save(pipeline.events()).await {
        tracing::warn!(error = %e, "failed to persist target language");
    }
}

fn report(pipeline: &Pipeline, outcome: PipelineResult<IntentOutcome>) {
    match outcome {
        Ok(IntentOutcome::Submitted { id }) => {
            if let Some(message) = pipeline.message(id) {
                println!("+ [{}] {}", message.detected_language, message.text);
            }
        }
        Ok(IntentOutcome::TargetLanguageSet { language }) => {
            println!("target language: {} ({})", language, language.code());
        }
        Ok(IntentOutcome::Snapshot(snapshot)) => print_messages(&snapshot.messages),
        Ok(outcome) => println!("= {:?}", outcome),
        Err(e) => println!("! {}", e),
    }
}

fn print_messages(messages: &[Message]) {
    if messages.is_empty() {
        println!("(no messages)");
        return;
    }
    for (i, message) in messages.iter().enumerate() {
        println!("{:>3}. [{}] {}", i + 1, message.detected_language, message.text);
        for lang in TargetLanguage::ALL {
            if let Some(text) = message.translations.get(&lang) {
                println!("       {}: {}", lang.code(), text);
            }
            if message.status.is_translating_to(lang) {
                println!("       {}: translating...", lang.code());
            }
        }
        if message.status.summarizing {
            println!("       summary: summarizing...");
        } else if let Some(summary) = &message.summary {
            println!("       summary: {}", summary);
        }
        if let Some(error) = &message.last_error {
            println!("       error: {}", error);
        }
    }
}
