//! One-shot raw command: `ts3bot query clientlist -uid`.

use ts3query_client::Ts3Client;
use ts3query_protocol::Command;

use crate::config::BotConfig;
use crate::error::{BotError, BotResult};

/// Builds a command from CLI tokens: `-name` is a flag, `key=value` an
/// argument. Values are escaped on the wire.
pub fn parse_command(verb: &str, tokens: &[String]) -> BotResult<Command> {
    if verb.is_empty() || verb.contains(char::is_whitespace) {
        return Err(BotError::InvalidArgument(format!("invalid command verb {verb:?}")));
    }

    let mut builder = Command::builder(verb);
    for token in tokens {
        if let Some(flag) = token.strip_prefix('-').filter(|f| !f.is_empty()) {
            builder = builder.flag(flag, true);
        } else if let Some((key, value)) = token.split_once('=').filter(|(k, _)| !k.is_empty()) {
            builder = builder.arg(key, value);
        } else {
            return Err(BotError::InvalidArgument(format!(
                "expected -flag or key=value, got {token:?}"
            )));
        }
    }
    Ok(builder.build())
}

/// Connects, sends the command and prints the response as JSON.
///
/// A non-zero error id is printed like any other response.
pub async fn query(config: &BotConfig, verb: &str, tokens: &[String]) -> BotResult<()> {
    let command = parse_command(verb, tokens)?;
    let client = Ts3Client::connect(&config.connection).await?;

    let result = client.connection().send(&command).await;
    let disconnected = client.disconnect().await;
    let response = result?;
    disconnected?;

    let json = serde_json::to_string_pretty(&response)
        .map_err(|e| BotError::InvalidArgument(format!("failed to render response: {e}")))?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn flags_and_args() {
        let command = parse_command("clientlist", &tokens(&["-uid", "-away"])).unwrap();
        assert_eq!(command.encoded(), b"clientlist -uid -away\n");

        let command = parse_command("sendtextmessage", &tokens(&["targetmode=3", "msg=hello world"])).unwrap();
        assert_eq!(
            command.encoded(),
            b"sendtextmessage targetmode=3 msg=hello\\sworld\n"
        );
    }

    #[test]
    fn value_may_contain_equals() {
        let command = parse_command("clientdbfind", &tokens(&["pattern=abc=", "-uid"])).unwrap();
        assert_eq!(command.encoded(), b"clientdbfind -uid pattern=abc=\n");
    }

    #[test]
    fn rejects_bare_words() {
        assert!(matches!(
            parse_command("clientinfo", &tokens(&["5"])),
            Err(BotError::InvalidArgument(_))
        ));
        assert!(parse_command("two words", &[]).is_err());
        assert!(parse_command("clientinfo", &tokens(&["=5"])).is_err());
    }
}
