use std::time::{Duration, Instant};

use nyxwallet_lib::{Activity, MixId, SessionSnapshot, WalletSession};
use tokio::sync::mpsc;

use crate::action::Action;

/// How long a notice or the "Copied!" marker stays on screen
const NOTICE_TTL: Duration = Duration::from_secs(6);

/// Current screen/view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Home,
    Send,
    Delegations,
    Activity,
}

/// Which part of the home screen receives keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HomeFocus {
    #[default]
    Mnemonic,
    Menu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SendField {
    #[default]
    Recipient,
    Amount,
    SendButton,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DelegationsField {
    #[default]
    Table,
    MixId,
    Amount,
    Validator,
}

#[derive(Debug, Clone, Default)]
pub struct SendForm {
    pub recipient: String,
    pub amount: String,
    pub focused_field: SendField,
}

#[derive(Debug, Clone, Default)]
pub struct DelegationsForm {
    pub mix_id: String,
    pub amount: String,
    pub validator: String,
    pub focused_field: DelegationsField,
}

/// Transient one-line message in the footer
#[derive(Debug, Clone)]
pub struct Notice {
    pub message: String,
    pub is_error: bool,
    pub shown_at: Instant,
}

/// Application state
pub struct App {
    /// Current screen
    pub screen: Screen,

    /// Whether the app should quit
    pub should_quit: bool,

    /// Shared wallet session, driven by tasks spawned from the main loop
    pub session: WalletSession,

    /// Copy of the session taken after the last change or tick
    pub snapshot: SessionSnapshot,

    /// Mnemonic being typed on the home screen, never rendered in clear
    pub mnemonic_input: String,

    pub home_focus: HomeFocus,

    pub send_form: SendForm,

    pub delegations_form: DelegationsForm,

    /// Selected index in lists (home menu, delegation table, activity log)
    pub selected_index: usize,

    pub notice: Option<Notice>,

    /// Action sender for async operations
    pub action_tx: mpsc::UnboundedSender<Action>,

    /// Show "Copied!" feedback (with timestamp for auto-clear)
    pub copied_feedback: Option<Instant>,
}

pub const HOME_MENU_LEN: usize = 5;

impl App {
    pub fn new(session: WalletSession, action_tx: mpsc::UnboundedSender<Action>) -> Self {
        let snapshot = session.snapshot();
        Self {
            screen: Screen::Home,
            should_quit: false,
            session,
            snapshot,
            mnemonic_input: String::new(),
            home_focus: HomeFocus::Mnemonic,
            send_form: SendForm::default(),
            delegations_form: DelegationsForm::default(),
            selected_index: 0,
            notice: None,
            action_tx,
            copied_feedback: None,
        }
    }

    pub fn should_show_copied(&self) -> bool {
        self.copied_feedback
            .is_some_and(|at| at.elapsed() < NOTICE_TTL)
    }

    /// Mix id typed into the delegation form, if it is a valid number
    pub fn parsed_mix_id(&self) -> Option<MixId> {
        self.delegations_form.mix_id.trim().parse().ok()
    }

    pub fn get_list_length(&self) -> usize {
        match self.screen {
            Screen::Home => HOME_MENU_LEN,
            Screen::Send => 0,
            Screen::Delegations => self
                .snapshot
                .delegations
                .as_ref()
                .map_or(0, Vec::len),
            Screen::Activity => self.snapshot.log.len(),
        }
    }

    fn notify(&mut self, message: impl Into<String>, is_error: bool) {
        self.notice = Some(Notice {
            message: message.into(),
            is_error,
            shown_at: Instant::now(),
        });
    }

    fn focused_input(&mut self) -> Option<&mut String> {
        match self.screen {
            Screen::Home if self.home_focus == HomeFocus::Mnemonic => Some(&mut self.mnemonic_input),
            Screen::Send => match self.send_form.focused_field {
                SendField::Recipient => Some(&mut self.send_form.recipient),
                SendField::Amount => Some(&mut self.send_form.amount),
                SendField::SendButton => None,
            },
            Screen::Delegations => match self.delegations_form.focused_field {
                DelegationsField::Table => None,
                DelegationsField::MixId => Some(&mut self.delegations_form.mix_id),
                DelegationsField::Amount => Some(&mut self.delegations_form.amount),
                DelegationsField::Validator => Some(&mut self.delegations_form.validator),
            },
            _ => None,
        }
    }

    fn accepts_char(&self, c: char) -> bool {
        match (self.screen, self.delegations_form.focused_field) {
            (Screen::Delegations, DelegationsField::MixId) => c.is_ascii_digit(),
            (Screen::Send, _) | (Screen::Delegations, _) => !c.is_whitespace(),
            _ => true,
        }
    }

    /// Handle an action and update state
    pub fn handle_action(&mut self, action: Action) {
        match action {
            // Navigation
            Action::NavigateHome => {
                self.screen = Screen::Home;
                self.selected_index = 0;
            }
            Action::NavigateSend => {
                self.screen = Screen::Send;
                self.send_form.focused_field = SendField::Recipient;
            }
            Action::NavigateDelegations => {
                self.screen = Screen::Delegations;
                self.selected_index = 0;
                self.delegations_form.focused_field = DelegationsField::Table;
            }
            Action::NavigateActivity => {
                self.screen = Screen::Activity;
                // newest entry first
                self.selected_index = 0;
            }

            Action::NextField => match self.screen {
                Screen::Home => {
                    self.home_focus = match self.home_focus {
                        HomeFocus::Mnemonic => HomeFocus::Menu,
                        HomeFocus::Menu => HomeFocus::Mnemonic,
                    };
                }
                Screen::Send => {
                    self.send_form.focused_field = match self.send_form.focused_field {
                        SendField::Recipient => SendField::Amount,
                        SendField::Amount => SendField::SendButton,
                        SendField::SendButton => SendField::Recipient,
                    };
                }
                Screen::Delegations => {
                    self.delegations_form.focused_field = match self.delegations_form.focused_field {
                        DelegationsField::Table => DelegationsField::MixId,
                        DelegationsField::MixId => DelegationsField::Amount,
                        DelegationsField::Amount => DelegationsField::Validator,
                        DelegationsField::Validator => DelegationsField::Table,
                    };
                }
                Screen::Activity => {}
            },
            Action::PrevField => match self.screen {
                Screen::Home => self.handle_action(Action::NextField),
                Screen::Send => {
                    self.send_form.focused_field = match self.send_form.focused_field {
                        SendField::Recipient => SendField::SendButton,
                        SendField::Amount => SendField::Recipient,
                        SendField::SendButton => SendField::Amount,
                    };
                }
                Screen::Delegations => {
                    self.delegations_form.focused_field = match self.delegations_form.focused_field {
                        DelegationsField::Table => DelegationsField::Validator,
                        DelegationsField::MixId => DelegationsField::Table,
                        DelegationsField::Amount => DelegationsField::MixId,
                        DelegationsField::Validator => DelegationsField::Amount,
                    };
                }
                Screen::Activity => {}
            },

            // List selection
            Action::SelectPrev => {
                let max = self.get_list_length();
                if max > 0 && self.selected_index > 0 {
                    self.selected_index -= 1;
                }
            }
            Action::SelectNext => {
                let max = self.get_list_length();
                if max > 0 && self.selected_index < max - 1 {
                    self.selected_index += 1;
                }
            }

            // Lifecycle
            Action::Quit => {
                self.should_quit = true;
            }
            Action::Tick => {
                self.snapshot = self.session.snapshot();
                if self
                    .notice
                    .as_ref()
                    .is_some_and(|notice| notice.shown_at.elapsed() >= NOTICE_TTL)
                {
                    self.notice = None;
                }
                let max = self.get_list_length();
                if self.selected_index >= max {
                    self.selected_index = max.saturating_sub(1);
                }
            }
            Action::Render => {
                // Render is handled in main loop
            }

            // Session
            Action::Connect => {
                self.home_focus = HomeFocus::Menu;
                self.notify("Connecting...", false);
            }
            Action::ConnectFinished(result) => {
                self.snapshot = self.session.snapshot();
                match result {
                    Ok(()) => self.notify("Connected", false),
                    Err(e) => self.notify(format!("Connect failed: {e}"), true),
                }
            }
            Action::Refresh => {
                self.notify("Refreshing balance and delegations", false);
            }
            Action::SessionChanged => {
                self.snapshot = self.session.snapshot();
            }

            // Wallet actions are spawned by the main loop
            Action::SendTokens
            | Action::Delegate
            | Action::UndelegateAll
            | Action::WithdrawRewards => {
                self.snapshot = self.session.snapshot();
            }
            Action::ActionFinished(activity, result) => {
                self.snapshot = self.session.snapshot();
                match result {
                    Ok(Some(_)) => {
                        match activity {
                            Activity::Send => self.send_form = SendForm::default(),
                            Activity::Delegate => {
                                self.delegations_form.mix_id.clear();
                                self.delegations_form.amount.clear();
                            }
                            _ => {}
                        }
                        self.notify(format!("{activity} succeeded, see Activity"), false);
                    }
                    Ok(None) => self.notify(format!("{activity}: nothing to do"), false),
                    Err(e) => self.notify(format!("{activity} failed: {e}"), true),
                }
            }

            // Text input
            Action::InputChar(c) => {
                if self.accepts_char(c) {
                    if let Some(input) = self.focused_input() {
                        input.push(c);
                    }
                }
            }
            Action::InputBackspace => {
                if let Some(input) = self.focused_input() {
                    input.pop();
                }
            }
            Action::InputClear => {
                if let Some(input) = self.focused_input() {
                    input.clear();
                }
            }
            Action::InputPaste(text) => {
                let on_home = self.screen == Screen::Home;
                let text: String = if on_home {
                    // phrases often arrive one word per line
                    text.split_whitespace().collect::<Vec<_>>().join(" ")
                } else {
                    text.chars().filter(|c| self.accepts_char(*c)).collect()
                };
                if let Some(input) = self.focused_input() {
                    if on_home && !input.is_empty() && !input.ends_with(' ') {
                        input.push(' ');
                    }
                    input.push_str(&text);
                }
            }

            Action::UseSelectedMixId => {
                let mix_id = self
                    .snapshot
                    .delegations
                    .as_ref()
                    .and_then(|records| records.get(self.selected_index))
                    .map(|record| record.mix_id);
                if let Some(mix_id) = mix_id {
                    self.delegations_form.mix_id = mix_id.to_string();
                    self.delegations_form.focused_field = DelegationsField::Amount;
                }
            }

            Action::ClearNotice => {
                self.notice = None;
            }

            // Clipboard
            Action::CopyAddress => {
                // Copy happens in the main loop
            }
            Action::CopiedFeedback => {
                self.copied_feedback = Some(Instant::now());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use nyxwallet_lib::{Config, NyxdConnector};

    use super::*;

    fn app() -> App {
        let (tx, _rx) = mpsc::unbounded_channel();
        let session = WalletSession::new(Config::default(), Arc::new(NyxdConnector));
        App::new(session, tx)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_action(Action::InputChar(c));
        }
    }

    #[test]
    fn typing_on_home_fills_the_mnemonic() {
        let mut app = app();
        type_text(&mut app, "word one");
        app.handle_action(Action::InputBackspace);
        assert_eq!(app.mnemonic_input, "word on");

        app.handle_action(Action::NextField);
        type_text(&mut app, "xyz");
        assert_eq!(app.mnemonic_input, "word on");
    }

    #[test]
    fn pasted_phrase_is_normalised_to_single_spaces() {
        let mut app = app();
        app.handle_action(Action::InputPaste("alpha\nbeta\r\n  gamma ".to_string()));
        assert_eq!(app.mnemonic_input, "alpha beta gamma");
        app.handle_action(Action::InputPaste("delta".to_string()));
        assert_eq!(app.mnemonic_input, "alpha beta gamma delta");
    }

    #[test]
    fn send_form_routes_input_by_focus() {
        let mut app = app();
        app.handle_action(Action::NavigateSend);
        type_text(&mut app, "n1 recipient");
        app.handle_action(Action::NextField);
        type_text(&mut app, "250");
        app.handle_action(Action::NextField);
        type_text(&mut app, "9");

        assert_eq!(app.send_form.recipient, "n1recipient");
        assert_eq!(app.send_form.amount, "250");
        assert_eq!(app.send_form.focused_field, SendField::SendButton);
        app.handle_action(Action::NextField);
        assert_eq!(app.send_form.focused_field, SendField::Recipient);
    }

    #[test]
    fn mix_id_field_only_takes_digits() {
        let mut app = app();
        app.handle_action(Action::NavigateDelegations);
        app.handle_action(Action::NextField);
        type_text(&mut app, "4a2");
        assert_eq!(app.delegations_form.mix_id, "42");
        assert_eq!(app.parsed_mix_id(), Some(42));

        app.handle_action(Action::PrevField);
        app.handle_action(Action::PrevField);
        assert_eq!(app.delegations_form.focused_field, DelegationsField::Validator);
    }

    #[test]
    fn successful_send_clears_the_form() {
        let mut app = app();
        app.send_form.recipient = "n1recipient".to_string();
        app.send_form.amount = "5".to_string();

        app.handle_action(Action::ActionFinished(Activity::Send, Err("boom".to_string())));
        assert_eq!(app.send_form.amount, "5");
        assert!(app.notice.as_ref().unwrap().is_error);

        let entry = nyxwallet_lib::LogEntry {
            timestamp: chrono::Local::now(),
            activity: Activity::Send,
            payload: "{}".to_string(),
        };
        app.handle_action(Action::ActionFinished(Activity::Send, Ok(Some(entry))));
        assert!(app.send_form.recipient.is_empty());
        assert!(!app.notice.as_ref().unwrap().is_error);
    }

    #[test]
    fn selection_stays_within_the_menu() {
        let mut app = app();
        for _ in 0..10 {
            app.handle_action(Action::SelectNext);
        }
        assert_eq!(app.selected_index, HOME_MENU_LEN - 1);
        app.handle_action(Action::NavigateHome);
        app.handle_action(Action::SelectPrev);
        assert_eq!(app.selected_index, 0);
    }

    #[test]
    fn quit_sets_flag() {
        let mut app = app();
        app.handle_action(Action::Quit);
        assert!(app.should_quit);
    }
}
