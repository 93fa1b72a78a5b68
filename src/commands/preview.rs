use crate::api::{self, Collective, Mode};
use crate::commands::{select_new, Out};
use crate::error::{ErrorType, IntoResult};
use crate::{format, Config, Result};
use chrono::{DateTime, Utc};

/// Fetches the recent transactions of the configured account and returns the messages that `run`
/// would post, without posting them. The webhook settings are not needed.
///
/// # Errors
/// - `ErrorType::Api` if the transactions cannot be fetched.
pub async fn preview(config: Config, mode: Mode) -> Result<Out<Vec<String>>> {
    let mut collective = api::collective(&config, mode).pub_result(ErrorType::Api)?;
    render(&config, collective.as_mut(), Utc::now()).await
}

async fn render(
    config: &Config,
    collective: &mut (dyn Collective + Send),
    now: DateTime<Utc>,
) -> Result<Out<Vec<String>>> {
    let selection = select_new(config, collective, now).await?;
    let messages: Vec<String> = selection.matching.iter().map(format::message).collect();

    let mut summary = format!(
        "{} of {} fetched transaction(s) would be sent to the webhook.",
        messages.len(),
        selection.fetched
    );
    for m in &messages {
        summary.push('\n');
        summary.push_str(m);
    }
    Ok(Out::new(summary, messages))
}
