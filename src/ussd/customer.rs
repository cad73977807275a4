// ussd/customer.rs
//
// Customer menu tree. Each stage pattern-matches the remaining tokens:
// no tokens left means "render this stage's prompt", a leading token means
// "consume it and move on". "0" restarts from the main menu.
use crate::db::matchdb::MatchExt;
use crate::db::providerdb::ProviderExt;
use crate::models::providermodel::{Landmark, Service, UserRole};
use crate::service::error::ServiceError;
use crate::utils::text::{clean_text, mask_phone};

use super::screen::Screen;
use super::{parse_index, Interpreter};

const MAX_LANDMARK_LEN: usize = 40;
const MAX_NOTE_LEN: usize = 60;
// Landmarks occupy picks 1..=6; 7 is reserved for typing a new one.
const LANDMARK_SLOTS: usize = 6;

pub async fn handle(
    ix: &Interpreter,
    phone: &str,
    tokens: &[String],
) -> Result<Screen, ServiceError> {
    match tokens {
        [] => Ok(main_menu(false)),
        [choice, rest @ ..] => match choice.as_str() {
            "1" => find_service(ix, phone, rest).await,
            "2" => my_requests(ix, phone).await,
            "3" => set_landmark(ix, phone, rest).await,
            "9" => switch_role(ix, phone).await,
            "0" => Ok(Screen::end("Bye.")),
            _ => Ok(main_menu(true)),
        },
    }
}

async fn find_service(
    ix: &Interpreter,
    phone: &str,
    tokens: &[String],
) -> Result<Screen, ServiceError> {
    let services = ix.db_client.list_services(None).await?;

    let (service, rest) = match tokens {
        [] => return Ok(service_menu(&services, false)),
        [pick, tail @ ..] => {
            if pick.as_str() == "0" {
                return Box::pin(handle(ix, phone, tail)).await;
            }
            match parse_index(pick, services.len()) {
                Some(i) => (&services[i], tail),
                None => return Ok(service_menu(&services, true)),
            }
        }
    };

    let villages = &ix.env.villages;
    let (village, rest) = match rest {
        [] => return Ok(village_menu(villages, false)),
        [pick, tail @ ..] => {
            if pick.as_str() == "0" {
                return Box::pin(handle(ix, phone, tail)).await;
            }
            match parse_index(pick, villages.len()) {
                Some(i) => (villages[i].as_str(), tail),
                None => return Ok(village_menu(villages, true)),
            }
        }
    };

    let landmarks = ix
        .db_client
        .list_landmarks(village, LANDMARK_SLOTS as i64)
        .await?;
    let (landmark, rest) = match rest {
        [] => return Ok(landmark_menu(village, &landmarks, false)),
        [pick, tail @ ..] => match pick.as_str() {
            "0" => return Box::pin(handle(ix, phone, tail)).await,
            "7" => match tail {
                [] => return Ok(Screen::cont("Type the landmark:")),
                [typed, tail2 @ ..] => {
                    let typed = clean_text(typed, MAX_LANDMARK_LEN);
                    if typed.is_empty() {
                        return Ok(Screen::cont(
                            "Landmark cannot be empty.\nType the landmark:",
                        ));
                    }
                    // New names feed the shared landmark list.
                    ix.db_client.add_landmark(village, &typed, "", phone).await?;
                    (typed, tail2)
                }
            },
            _ => match parse_index(pick, landmarks.len()) {
                Some(i) => (landmarks[i].name.clone(), tail),
                None => return Ok(landmark_menu(village, &landmarks, true)),
            },
        },
    };

    let note = match rest {
        [] => return Ok(Screen::cont("Any note for the provider? (0 = skip)")),
        [typed, ..] => {
            if typed.as_str() == "0" {
                String::new()
            } else {
                clean_text(typed, MAX_NOTE_LEN)
            }
        }
    };

    // Remember where this customer is for next time.
    ix.db_client.set_customer_village(phone, village).await?;
    ix.db_client.set_customer_landmark(phone, &landmark).await?;

    let request = ix
        .matching
        .create_request(phone, service.id, village, &landmark, &note)
        .await?;
    let offered = ix.matching.build_offers(request.id).await?;

    if offered > 0 {
        Ok(Screen::end(format!(
            "Request #{} sent to {} nearby provider(s). You will be contacted soon.",
            request.id, offered
        )))
    } else {
        Ok(Screen::end(format!(
            "Request #{} saved. No providers available yet - we will keep looking.",
            request.id
        )))
    }
}

async fn my_requests(ix: &Interpreter, phone: &str) -> Result<Screen, ServiceError> {
    let rows = ix
        .db_client
        .requests_by_customer(phone, ix.env.max_list as i64)
        .await?;
    if rows.is_empty() {
        return Ok(Screen::end(
            "No requests yet. Choose 'Find a service' to make one.",
        ));
    }
    let mut lines = vec!["Your requests:".to_string()];
    for r in rows {
        // Provider numbers stay hidden from customers.
        let line = match r.assigned_provider.as_deref() {
            Some(provider) => format!(
                "#{} {} - {} ({})",
                r.id,
                r.service_name,
                r.status.label(),
                mask_phone(provider)
            ),
            None => format!("#{} {} - {}", r.id, r.service_name, r.status.label()),
        };
        lines.push(line);
    }
    Ok(Screen::end(lines.join("\n")))
}

async fn set_landmark(
    ix: &Interpreter,
    phone: &str,
    tokens: &[String],
) -> Result<Screen, ServiceError> {
    match tokens {
        [] => Ok(Screen::cont("Type your usual landmark:")),
        [typed, ..] => {
            let landmark = clean_text(typed, MAX_LANDMARK_LEN);
            if landmark.is_empty() {
                return Ok(Screen::cont(
                    "Landmark cannot be empty.\nType your usual landmark:",
                ));
            }
            ix.db_client.set_customer_landmark(phone, &landmark).await?;
            Ok(Screen::end(format!("Landmark saved: {}", landmark)))
        }
    }
}

async fn switch_role(ix: &Interpreter, phone: &str) -> Result<Screen, ServiceError> {
    ix.db_client
        .set_role(phone, UserRole::Provider, None)
        .await?;
    Ok(Screen::end(
        "You are now a service provider. Dial again for the provider menu.",
    ))
}

fn main_menu(invalid: bool) -> Screen {
    let mut text = String::new();
    if invalid {
        text.push_str("Invalid choice.\n");
    }
    text.push_str(
        "Karibu VillageLink\n1. Find a service\n2. My requests\n3. Set my landmark\n9. Switch to provider\n0. Exit",
    );
    Screen::cont(text)
}

fn service_menu(services: &[Service], invalid: bool) -> Screen {
    let mut lines = Vec::new();
    if invalid {
        lines.push("Invalid choice.".to_string());
    }
    lines.push("Which service?".to_string());
    for (i, s) in services.iter().enumerate() {
        lines.push(format!("{}. {}", i + 1, s.name));
    }
    lines.push("0. Back".to_string());
    Screen::cont(lines.join("\n"))
}

fn village_menu(villages: &[String], invalid: bool) -> Screen {
    let mut lines = Vec::new();
    if invalid {
        lines.push("Invalid choice.".to_string());
    }
    lines.push("Which village?".to_string());
    for (i, v) in villages.iter().enumerate() {
        lines.push(format!("{}. {}", i + 1, v));
    }
    lines.push("0. Back".to_string());
    Screen::cont(lines.join("\n"))
}

fn landmark_menu(village: &str, landmarks: &[Landmark], invalid: bool) -> Screen {
    let mut lines = Vec::new();
    if invalid {
        lines.push("Invalid choice.".to_string());
    }
    lines.push(format!("Landmark in {}:", village));
    for (i, lm) in landmarks.iter().take(LANDMARK_SLOTS).enumerate() {
        lines.push(format!("{}. {}", i + 1, lm.name));
    }
    lines.push("7. Type a new landmark".to_string());
    lines.push("0. Back".to_string());
    Screen::cont(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::providermodel::ServiceKind;
    use chrono::Utc;

    fn service(id: i32, name: &str) -> Service {
        Service {
            id,
            name: name.to_string(),
            kind: ServiceKind::Any,
        }
    }

    fn landmark(name: &str) -> Landmark {
        Landmark {
            id: 1,
            village: "Bumala".to_string(),
            name: name.to_string(),
            description: String::new(),
            added_by: "+254700000001".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn main_menu_lists_all_options() {
        let screen = main_menu(false);
        assert!(!screen.terminal);
        for line in ["1. Find a service", "2. My requests", "3. Set my landmark", "0. Exit"] {
            assert!(screen.text.contains(line), "missing {line}");
        }
        assert!(!screen.text.contains("Invalid"));
    }

    #[test]
    fn invalid_pick_prefixes_the_menu() {
        assert!(main_menu(true).text.starts_with("Invalid choice."));
    }

    #[test]
    fn service_menu_numbers_from_one() {
        let screen = service_menu(&[service(4, "Plumber"), service(1, "Rider")], false);
        assert!(screen.text.contains("1. Plumber"));
        assert!(screen.text.contains("2. Rider"));
        assert!(screen.text.contains("0. Back"));
    }

    #[test]
    fn landmark_menu_reserves_slot_seven_for_typing() {
        let screen = landmark_menu("Bumala", &[landmark("Market Gate")], false);
        assert!(screen.text.contains("1. Market Gate"));
        assert!(screen.text.contains("7. Type a new landmark"));
    }

    #[test]
    fn landmark_menu_never_numbers_past_six() {
        let many: Vec<Landmark> = (0..10).map(|i| landmark(&format!("L{i}"))).collect();
        let screen = landmark_menu("Bumala", &many, false);
        assert!(screen.text.contains("6. L5"));
        assert!(!screen.text.contains("7. L6"));
    }
}
