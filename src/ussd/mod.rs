// ussd/mod.rs
//
// Stateless menu interpreter. Every gateway callback carries the caller's
// full accumulated input ("1*2*Market Gate"); the current position in the
// menu tree is re-derived from scratch each time from that token list plus
// the caller's durable preferences. No per-session state lives in memory.
pub mod customer;
pub mod provider;
pub mod screen;

use std::sync::Arc;

use crate::config::Config;
use crate::db::db::DBClient;
use crate::db::providerdb::ProviderExt;
use crate::models::providermodel::UserRole;
use crate::service::error::ServiceError;
use crate::service::matching_service::MatchingService;
use crate::utils::text::normalize_phone;

use screen::Screen;

pub struct Interpreter {
    pub(crate) db_client: Arc<DBClient>,
    pub(crate) matching: Arc<MatchingService>,
    pub(crate) env: Config,
}

impl Interpreter {
    pub fn new(db_client: Arc<DBClient>, matching: Arc<MatchingService>, env: Config) -> Self {
        Self {
            db_client,
            matching,
            env,
        }
    }

    /// Render the screen for one gateway callback. Infallible by contract:
    /// a store failure becomes a terminal apology rather than an HTTP error
    /// the gateway would mangle.
    pub async fn render(&self, session_id: &str, phone_number: &str, text: &str) -> Screen {
        let phone = normalize_phone(phone_number);
        let tokens = parse_text(text);
        match self.dispatch(session_id, &phone, &tokens).await {
            Ok(screen) => screen,
            Err(err) => {
                tracing::error!("session {} failed: {}", session_id, err);
                Screen::end("System error. Please try again later.")
            }
        }
    }

    async fn dispatch(
        &self,
        session_id: &str,
        phone: &str,
        tokens: &[String],
    ) -> Result<Screen, ServiceError> {
        let prefs = self.db_client.get_prefs(phone).await?;
        let role = prefs.as_ref().and_then(|p| p.role);

        let role = match role {
            Some(role) => role,
            None => return self.role_gate(session_id, phone, tokens).await,
        };

        // If this very conversation performed the role selection, its
        // accumulated input still carries the gate tokens in front; they
        // must keep being consumed or every later position shifts by one.
        let same_session = prefs
            .as_ref()
            .and_then(|p| p.role_session.as_deref())
            .map(|s| s == session_id)
            .unwrap_or(false);
        let tokens = if same_session {
            strip_gate_tokens(tokens)
        } else {
            tokens
        };

        match role {
            UserRole::Customer => customer::handle(self, phone, tokens).await,
            UserRole::Provider => provider::handle(self, phone, tokens).await,
        }
    }

    async fn role_gate(
        &self,
        session_id: &str,
        phone: &str,
        tokens: &[String],
    ) -> Result<Screen, ServiceError> {
        let mut remaining = tokens;
        while let [first, tail @ ..] = remaining {
            match first.as_str() {
                "1" => {
                    self.db_client
                        .set_role(phone, UserRole::Customer, Some(session_id))
                        .await?;
                    return customer::handle(self, phone, tail).await;
                }
                "2" => {
                    self.db_client
                        .set_role(phone, UserRole::Provider, Some(session_id))
                        .await?;
                    return provider::handle(self, phone, tail).await;
                }
                "0" => return Ok(Screen::end("Bye.")),
                // Unknown gate tokens are consumed, mirroring what
                // strip_gate_tokens does on the next callback.
                _ => remaining = tail,
            }
        }
        Ok(role_menu(!tokens.is_empty()))
    }
}

fn role_menu(invalid: bool) -> Screen {
    let mut text = String::new();
    if invalid {
        text.push_str("Invalid choice.\n");
    }
    text.push_str("Karibu VillageLink\n1. I need a service\n2. I offer a service\n0. Exit");
    Screen::cont(text)
}

/// Split the accumulated input on '*'. Empty input means the caller just
/// dialed in.
pub(crate) fn parse_text(text: &str) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split('*').map(|t| t.trim().to_string()).collect()
}

/// Drop everything up to and including the first role token ("1" or "2").
/// Only used for the conversation that selected the role: the gate consumed
/// unknown tokens until it saw one of those, so this re-applies the exact
/// same consumption.
fn strip_gate_tokens(tokens: &[String]) -> &[String] {
    match tokens.iter().position(|t| t == "1" || t == "2") {
        Some(pos) => &tokens[pos + 1..],
        None => &[],
    }
}

/// One-based menu pick into a zero-based index, bounded by the list length.
pub(crate) fn parse_index(token: &str, len: usize) -> Option<usize> {
    token
        .parse::<usize>()
        .ok()
        .filter(|i| *i >= 1 && *i <= len)
        .map(|i| i - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(input: &[&str]) -> Vec<String> {
        input.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_text_splits_on_star() {
        assert_eq!(parse_text("1*2*Market Gate"), toks(&["1", "2", "Market Gate"]));
        assert_eq!(parse_text(""), Vec::<String>::new());
        assert_eq!(parse_text("   "), Vec::<String>::new());
    }

    #[test]
    fn parse_text_trims_tokens() {
        assert_eq!(parse_text(" 1 * 2 "), toks(&["1", "2"]));
    }

    #[test]
    fn gate_tokens_strip_through_first_role_pick() {
        let tokens = toks(&["7", "1", "3"]);
        assert_eq!(strip_gate_tokens(&tokens), &toks(&["3"])[..]);

        let tokens = toks(&["2"]);
        assert!(strip_gate_tokens(&tokens).is_empty());
    }

    #[test]
    fn parse_index_is_one_based_and_bounded() {
        assert_eq!(parse_index("1", 3), Some(0));
        assert_eq!(parse_index("3", 3), Some(2));
        assert_eq!(parse_index("0", 3), None);
        assert_eq!(parse_index("4", 3), None);
        assert_eq!(parse_index("x", 3), None);
    }

    #[test]
    fn role_menu_offers_both_roles() {
        let screen = role_menu(false);
        assert!(!screen.terminal);
        assert!(screen.text.contains("1. I need a service"));
        assert!(screen.text.contains("2. I offer a service"));
    }
}
