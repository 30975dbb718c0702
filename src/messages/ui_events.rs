//! UI events - messages from the presentation layer to the App layer

use crate::auth::{Authentication, OAuth2Auth};
use crate::models::HttpMethod;

/// Events generated by user gestures in the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    // Tree navigation
    SelectRow(usize),
    SelectNext,
    SelectPrev,
    ActivateSelected,

    // Collection editing
    NewGroup(String),
    NewRequest(String),
    SaveRequest {
        name: String,
        method: HttpMethod,
        url: String,
    },
    CloneSelected(String),
    RenameSelected(String),
    DeleteSelected,

    // Active request editing
    SetUrl(String),
    CycleMethod,
    AddHeader(String, String),
    RemoveHeader(String),
    SetHeaderLine(String, String),
    SetContentType(Option<String>),
    SetPayload(String),
    FormatBody,
    SetAuthentication(Authentication),

    // Exchange
    SendRequest,
    CancelRequest,

    // System
    Refresh,
    Quit,
}

impl UiEvent {
    /// Whether handling this event changes persisted data
    pub fn mutates_collection(&self) -> bool {
        !matches!(
            self,
            UiEvent::SelectRow(_)
                | UiEvent::SelectNext
                | UiEvent::SelectPrev
                | UiEvent::SendRequest
                | UiEvent::CancelRequest
                | UiEvent::Refresh
                | UiEvent::Quit
        )
    }
}

/// Convert a typed command line into a UiEvent
pub fn line_to_ui_event(line: &str) -> Option<UiEvent> {
    let line = line.trim();
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    let event = match command {
        "" | "tree" => UiEvent::Refresh,
        "select" => UiEvent::SelectRow(rest.parse().ok()?),
        "next" | "j" => UiEvent::SelectNext,
        "prev" | "k" => UiEvent::SelectPrev,
        "open" => UiEvent::ActivateSelected,
        "new-group" if !rest.is_empty() => UiEvent::NewGroup(rest.to_string()),
        "new-request" if !rest.is_empty() => UiEvent::NewRequest(rest.to_string()),
        "save" if args.len() >= 2 => UiEvent::SaveRequest {
            name: args[1..].join(" "),
            method: HttpMethod::GET,
            url: args[0].to_string(),
        },
        "clone" if !rest.is_empty() => UiEvent::CloneSelected(rest.to_string()),
        "rename" if !rest.is_empty() => UiEvent::RenameSelected(rest.to_string()),
        "delete" => UiEvent::DeleteSelected,
        "url" => UiEvent::SetUrl(rest.to_string()),
        "method" => UiEvent::CycleMethod,
        "header" => {
            let (key, value) = rest.split_once(char::is_whitespace)?;
            UiEvent::SetHeaderLine(key.to_string(), value.trim().to_string())
        }
        "add-header" => {
            let (key, value) = rest.split_once(char::is_whitespace)?;
            UiEvent::AddHeader(key.to_string(), value.trim().to_string())
        }
        "unset-header" if !rest.is_empty() => UiEvent::RemoveHeader(rest.to_string()),
        "body" => match rest {
            "" | "none" => UiEvent::SetContentType(None),
            ct => UiEvent::SetContentType(Some(ct.to_string())),
        },
        "payload" => UiEvent::SetPayload(rest.to_string()),
        "format" => UiEvent::FormatBody,
        "auth" => UiEvent::SetAuthentication(parse_auth(&args)?),
        "send" | "s" => UiEvent::SendRequest,
        "cancel" => UiEvent::CancelRequest,
        "quit" | "q" => UiEvent::Quit,
        _ => return None,
    };
    Some(event)
}

fn parse_auth(args: &[&str]) -> Option<Authentication> {
    match args {
        ["none"] => Some(Authentication::None),
        ["basic", username, password] => Some(Authentication::basic(*username, *password)),
        ["oauth2", token_url, client_id, client_secret, grant_type, scope @ ..] => {
            Some(Authentication::OAuth2(OAuth2Auth {
                token_url: token_url.to_string(),
                client_id: client_id.to_string(),
                client_secret: client_secret.to_string(),
                grant_type: grant_type.to_string(),
                scope: scope.join(" "),
            }))
        }
        _ => None,
    }
}
