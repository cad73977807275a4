// ussd/provider.rs
//
// Provider menu tree. Everything except profile setup requires a saved
// profile; without one the other branches end the session and point at
// option 1.
use crate::db::matchdb::MatchExt;
use crate::db::providerdb::ProviderExt;
use crate::models::matchmodel::{AcceptOutcome, ActiveJob, PendingOffer};
use crate::models::providermodel::{Landmark, ProviderKind, Service, UserRole};
use crate::service::error::ServiceError;
use crate::utils::text::clean_text;

use super::screen::Screen;
use super::{parse_index, Interpreter};

const MAX_NAME_LEN: usize = 28;
const MAX_LANDMARK_LEN: usize = 40;
const MAX_AFFILIATION_LEN: usize = 20;
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
            "1" => profile(ix, phone, rest).await,
            "2" => services_toggle(ix, phone, rest).await,
            "3" => set_landmark(ix, phone, rest).await,
            "4" => incoming(ix, phone, rest).await,
            "5" => complete(ix, phone, rest).await,
            "9" => switch_role(ix, phone).await,
            "0" => Ok(Screen::end("Bye.")),
            _ => Ok(main_menu(true)),
        },
    }
}

async fn profile(
    ix: &Interpreter,
    phone: &str,
    tokens: &[String],
) -> Result<Screen, ServiceError> {
    let (kind, rest) = match tokens {
        [] => return Ok(kind_menu(false)),
        [pick, tail @ ..] => match pick.as_str() {
            "0" => return Box::pin(handle(ix, phone, tail)).await,
            "1" => (ProviderKind::Rider, tail),
            "2" => (ProviderKind::Business, tail),
            _ => return Ok(kind_menu(true)),
        },
    };

    let (name, rest) = match rest {
        [] => return Ok(Screen::cont("Your name or business name:")),
        [typed, tail @ ..] => {
            let name = clean_text(typed, MAX_NAME_LEN);
            if name.is_empty() {
                return Ok(Screen::cont(
                    "Name cannot be empty.\nYour name or business name:",
                ));
            }
            (name, tail)
        }
    };

    let villages = &ix.env.villages;
    let (village, rest) = match rest {
        [] => return Ok(village_menu(villages, false)),
        [pick, tail @ ..] => match parse_index(pick, villages.len()) {
            Some(i) => (villages[i].as_str(), tail),
            None => return Ok(village_menu(villages, true)),
        },
    };

    let affiliation = match rest {
        [] => return Ok(Screen::cont("Group or sacco affiliation (0 = none):")),
        [typed, ..] => {
            if typed.as_str() == "0" {
                String::new()
            } else {
                clean_text(typed, MAX_AFFILIATION_LEN)
            }
        }
    };

    let provider = ix
        .db_client
        .upsert_provider(phone, kind, &name, village, &affiliation)
        .await?;
    Ok(Screen::end(format!(
        "Profile saved. Welcome, {}!\nDial again to choose your services.",
        provider.name
    )))
}

async fn services_toggle(
    ix: &Interpreter,
    phone: &str,
    tokens: &[String],
) -> Result<Screen, ServiceError> {
    let provider = match ix.db_client.get_provider(phone).await? {
        Some(p) => p,
        None => return Ok(profile_required()),
    };
    let services = ix.db_client.list_services(Some(provider.kind)).await?;

    let mut invalid = false;
    let mut remaining = tokens;
    while let [pick, tail @ ..] = remaining {
        if pick.as_str() == "0" {
            return Box::pin(handle(ix, phone, tail)).await;
        }
        match parse_index(pick, services.len()) {
            Some(i) => {
                let active = ix.db_client.active_service_ids(phone).await?;
                let currently = active.contains(&services[i].id);
                ix.db_client
                    .set_provider_service(phone, services[i].id, !currently)
                    .await?;
            }
            None => invalid = true,
        }
        remaining = tail;
    }

    let active = ix.db_client.active_service_ids(phone).await?;
    Ok(services_menu(&services, &active, invalid))
}

async fn set_landmark(
    ix: &Interpreter,
    phone: &str,
    tokens: &[String],
) -> Result<Screen, ServiceError> {
    let provider = match ix.db_client.get_provider(phone).await? {
        Some(p) => p,
        None => return Ok(profile_required()),
    };
    let landmarks = ix
        .db_client
        .list_landmarks(&provider.village, LANDMARK_SLOTS as i64)
        .await?;

    let landmark = match tokens {
        [] => return Ok(landmark_menu(&provider.village, &landmarks, false)),
        [pick, tail @ ..] => match pick.as_str() {
            "0" => return Box::pin(handle(ix, phone, tail)).await,
            "7" => match tail {
                [] => return Ok(Screen::cont("Type the landmark:")),
                [typed, ..] => {
                    let typed = clean_text(typed, MAX_LANDMARK_LEN);
                    if typed.is_empty() {
                        return Ok(Screen::cont(
                            "Landmark cannot be empty.\nType the landmark:",
                        ));
                    }
                    // New names feed the shared landmark list.
                    ix.db_client
                        .add_landmark(&provider.village, &typed, "", phone)
                        .await?;
                    typed
                }
            },
            _ => match parse_index(pick, landmarks.len()) {
                Some(i) => landmarks[i].name.clone(),
                None => return Ok(landmark_menu(&provider.village, &landmarks, true)),
            },
        },
    };

    ix.db_client.set_provider_landmark(phone, &landmark).await?;
    Ok(Screen::end(format!("Location updated: {}", landmark)))
}

async fn incoming(
    ix: &Interpreter,
    phone: &str,
    tokens: &[String],
) -> Result<Screen, ServiceError> {
    if ix.db_client.get_provider(phone).await?.is_none() {
        return Ok(profile_required());
    }
    let offers = ix
        .db_client
        .pending_offers(phone, ix.env.max_list as i64)
        .await?;

    let (offer, rest) = match tokens {
        [] => {
            if offers.is_empty() {
                return Ok(Screen::end("No incoming requests right now."));
            }
            return Ok(offers_menu(&offers, false));
        }
        [pick, tail @ ..] => {
            if pick.as_str() == "0" {
                return Box::pin(handle(ix, phone, tail)).await;
            }
            match parse_index(pick, offers.len()) {
                Some(i) => (&offers[i], tail),
                None => return Ok(offers_menu(&offers, true)),
            }
        }
    };

    match rest {
        [] => Ok(offer_detail(offer, false)),
        [action, tail @ ..] => match action.as_str() {
            "1" => match ix.matching.accept_offer(phone, offer.offer_id).await? {
                AcceptOutcome::Accepted => {
                    let customer = ix
                        .db_client
                        .get_request(offer.request_id)
                        .await?
                        .map(|r| r.customer_phone)
                        .unwrap_or_default();
                    Ok(Screen::end(format!(
                        "Job #{} is yours. Call the customer: {}",
                        offer.request_id, customer
                    )))
                }
                AcceptOutcome::NotAvailable => Ok(Screen::end(format!(
                    "Too late - request #{} was taken.",
                    offer.request_id
                ))),
            },
            "2" => {
                let passed = ix.matching.pass_offer(phone, offer.offer_id).await?;
                if passed {
                    Ok(Screen::end(format!("Passed on request #{}.", offer.request_id)))
                } else {
                    Ok(Screen::end(format!(
                        "Request #{} was already handled.",
                        offer.request_id
                    )))
                }
            }
            "0" => Box::pin(incoming(ix, phone, tail)).await,
            _ => Ok(offer_detail(offer, true)),
        },
    }
}

async fn complete(
    ix: &Interpreter,
    phone: &str,
    tokens: &[String],
) -> Result<Screen, ServiceError> {
    if ix.db_client.get_provider(phone).await?.is_none() {
        return Ok(profile_required());
    }
    let jobs = ix
        .db_client
        .active_jobs(phone, ix.env.max_list as i64)
        .await?;

    let (job, rest) = match tokens {
        [] => {
            if jobs.is_empty() {
                return Ok(Screen::end("No active jobs."));
            }
            return Ok(jobs_menu(&jobs, false));
        }
        [pick, tail @ ..] => {
            if pick.as_str() == "0" {
                return Box::pin(handle(ix, phone, tail)).await;
            }
            match parse_index(pick, jobs.len()) {
                Some(i) => (&jobs[i], tail),
                None => return Ok(jobs_menu(&jobs, true)),
            }
        }
    };

    match rest {
        [] => Ok(confirm_menu(job, false)),
        [confirmed, tail @ ..] => match confirmed.as_str() {
            "1" => {
                let done = ix.matching.complete_job(phone, job.request_id).await?;
                if done {
                    Ok(Screen::end(format!("Job #{} completed. Asante!", job.request_id)))
                } else {
                    Ok(Screen::end(format!(
                        "Job #{} could not be completed. It may be closed already.",
                        job.request_id
                    )))
                }
            }
            "0" => Box::pin(complete(ix, phone, tail)).await,
            _ => Ok(confirm_menu(job, true)),
        },
    }
}

async fn switch_role(ix: &Interpreter, phone: &str) -> Result<Screen, ServiceError> {
    ix.db_client
        .set_role(phone, UserRole::Customer, None)
        .await?;
    Ok(Screen::end(
        "You are now a customer. Dial again for the customer menu.",
    ))
}

fn profile_required() -> Screen {
    Screen::end("Set up your profile first (option 1 on the provider menu).")
}

fn main_menu(invalid: bool) -> Screen {
    let mut text = String::new();
    if invalid {
        text.push_str("Invalid choice.\n");
    }
    text.push_str(
        "VillageLink Provider\n1. My profile\n2. My services\n3. Set my location\n4. Incoming requests\n5. Complete a job\n9. Switch to customer\n0. Exit",
    );
    Screen::cont(text)
}

fn kind_menu(invalid: bool) -> Screen {
    let mut text = String::new();
    if invalid {
        text.push_str("Invalid choice.\n");
    }
    text.push_str("Provider type:\n1. Rider (boda/tuktuk)\n2. Business / artisan\n0. Back");
    Screen::cont(text)
}

fn village_menu(villages: &[String], invalid: bool) -> Screen {
    let mut lines = Vec::new();
    if invalid {
        lines.push("Invalid choice.".to_string());
    }
    lines.push("Your village:".to_string());
    for (i, v) in villages.iter().enumerate() {
        lines.push(format!("{}. {}", i + 1, v));
    }
    Screen::cont(lines.join("\n"))
}

fn landmark_menu(village: &str, landmarks: &[Landmark], invalid: bool) -> Screen {
    let mut lines = Vec::new();
    if invalid {
        lines.push("Invalid choice.".to_string());
    }
    lines.push(format!("Where are you now in {}?", village));
    for (i, lm) in landmarks.iter().take(LANDMARK_SLOTS).enumerate() {
        lines.push(format!("{}. {}", i + 1, lm.name));
    }
    lines.push("7. Type a new landmark".to_string());
    lines.push("0. Back".to_string());
    Screen::cont(lines.join("\n"))
}

fn services_menu(services: &[Service], active: &[i32], invalid: bool) -> Screen {
    let mut lines = Vec::new();
    if invalid {
        lines.push("Invalid choice.".to_string());
    }
    lines.push("Your services (pick to toggle):".to_string());
    for (i, s) in services.iter().enumerate() {
        let mark = if active.contains(&s.id) { "[+]" } else { "[ ]" };
        lines.push(format!("{}. {} {}", i + 1, mark, s.name));
    }
    lines.push("0. Back".to_string());
    Screen::cont(lines.join("\n"))
}

fn offers_menu(offers: &[PendingOffer], invalid: bool) -> Screen {
    let mut lines = Vec::new();
    if invalid {
        lines.push("Invalid choice.".to_string());
    }
    lines.push("Incoming requests:".to_string());
    for (i, o) in offers.iter().enumerate() {
        lines.push(format!(
            "{}. #{} {} (~{}m)",
            i + 1,
            o.request_id,
            o.landmark,
            o.eta_minutes
        ));
    }
    lines.push("0. Back".to_string());
    Screen::cont(lines.join("\n"))
}

fn offer_detail(offer: &PendingOffer, invalid: bool) -> Screen {
    let mut lines = Vec::new();
    if invalid {
        lines.push("Invalid choice.".to_string());
    }
    lines.push(format!("Request #{}", offer.request_id));
    lines.push(format!("Where: {}, {}", offer.village, offer.landmark));
    let note = if offer.note.is_empty() {
        "-"
    } else {
        offer.note.as_str()
    };
    lines.push(format!("Note: {}", note));
    lines.push(format!("ETA ~{}m", offer.eta_minutes));
    lines.push("1. Accept".to_string());
    lines.push("2. Pass".to_string());
    lines.push("0. Back".to_string());
    Screen::cont(lines.join("\n"))
}

fn jobs_menu(jobs: &[ActiveJob], invalid: bool) -> Screen {
    let mut lines = Vec::new();
    if invalid {
        lines.push("Invalid choice.".to_string());
    }
    lines.push("Complete which job?".to_string());
    for (i, j) in jobs.iter().enumerate() {
        lines.push(format!(
            "{}. #{} {} at {}",
            i + 1,
            j.request_id,
            j.service_name,
            j.landmark
        ));
    }
    lines.push("0. Back".to_string());
    Screen::cont(lines.join("\n"))
}

fn confirm_menu(job: &ActiveJob, invalid: bool) -> Screen {
    let mut lines = Vec::new();
    if invalid {
        lines.push("Invalid choice.".to_string());
    }
    lines.push(format!("Mark job #{} ({}) as done?", job.request_id, job.service_name));
    lines.push("1. Yes".to_string());
    lines.push("0. Back".to_string());
    Screen::cont(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::providermodel::ServiceKind;

    fn service(id: i32, name: &str) -> Service {
        Service {
            id,
            name: name.to_string(),
            kind: ServiceKind::Business,
        }
    }

    fn pending(offer_id: i64, request_id: i64) -> PendingOffer {
        PendingOffer {
            offer_id,
            request_id,
            eta_minutes: 7,
            village: "Bumala".to_string(),
            landmark: "Market Gate".to_string(),
            note: String::new(),
        }
    }

    #[test]
    fn services_menu_marks_active_entries() {
        let screen = services_menu(
            &[service(1, "Plumber"), service(2, "Carpenter")],
            &[2],
            false,
        );
        assert!(screen.text.contains("1. [ ] Plumber"));
        assert!(screen.text.contains("2. [+] Carpenter"));
    }

    #[test]
    fn offer_detail_shows_placeholder_for_empty_note() {
        let screen = offer_detail(&pending(10, 42), false);
        assert!(screen.text.contains("Request #42"));
        assert!(screen.text.contains("Note: -"));
        assert!(screen.text.contains("1. Accept"));
    }

    #[test]
    fn offers_menu_shows_eta() {
        let screen = offers_menu(&[pending(10, 42)], false);
        assert!(screen.text.contains("1. #42 Market Gate (~7m)"));
    }

    #[test]
    fn profile_required_is_terminal() {
        assert!(profile_required().terminal);
    }
}
