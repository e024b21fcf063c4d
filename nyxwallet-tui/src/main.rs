mod action;
mod app;
mod components;
mod event;
mod tui;

use std::fs::{self, OpenOptions};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use nyxwallet_lib::{Activity, Config, LogEntry, Mnemonic, NyxdConnector, WalletSession};
use tokio::sync::mpsc;

use action::Action;
use app::{App, DelegationsField, HomeFocus, Screen, SendField};
use components::{
    activity::ActivityComponent, delegations::DelegationsComponent, home::HomeComponent,
    send::SendComponent,
};
use event::{Event, EventHandler};
use tui::Tui;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let log_path = init_logging()?;
    let config = Config::load()?;
    if !Config::default_path()?.exists() {
        // leave an editable file behind on first start
        if let Err(err) = config.save() {
            log::warn!("could not write default config: {err}");
        }
    }
    log::info!(
        "starting against {} (denom {}), diagnostics in {}",
        config.api_url,
        config.denom,
        log_path.display()
    );

    // Create action channel
    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();

    // Initialize app state
    let session = WalletSession::new(config, Arc::new(NyxdConnector));
    let mut app = App::new(session, action_tx.clone());

    // Initialize TUI
    let mut tui = Tui::new()?;
    tui.enter()?;

    // Start event handler
    let mut events = EventHandler::new(Duration::from_millis(250));

    // Main event loop
    loop {
        tui.draw(|frame| match app.screen {
            Screen::Home => HomeComponent::render(&app, frame),
            Screen::Send => SendComponent::render(&app, frame),
            Screen::Delegations => DelegationsComponent::render(&app, frame),
            Screen::Activity => ActivityComponent::render(&app, frame),
        })?;

        tokio::select! {
            // Terminal events
            Some(event) = events.next() => {
                for action in handle_event(&app, event) {
                    action_tx.send(action)?;
                }
            }

            // Actions from async operations
            Some(action) = action_rx.recv() => {
                match &action {
                    Action::Connect => {
                        let session = app.session.clone();
                        let mnemonic = Mnemonic::new(app.mnemonic_input.clone());
                        let tx = action_tx.clone();
                        tokio::spawn(async move {
                            let result = session.connect(mnemonic).await.map_err(|e| e.to_string());
                            let _ = tx.send(Action::ConnectFinished(result));
                            refresh(&session, &tx).await;
                        });
                    }
                    Action::Refresh => {
                        app.session.invalidate_cache();
                        let session = app.session.clone();
                        let tx = action_tx.clone();
                        tokio::spawn(async move {
                            refresh(&session, &tx).await;
                        });
                    }
                    Action::SendTokens => {
                        let session = app.session.clone();
                        let recipient = app.send_form.recipient.clone();
                        let amount = app.send_form.amount.clone();
                        spawn_action(&action_tx, Activity::Send, async move {
                            session.send_tokens(&recipient, &amount).await
                        });
                    }
                    Action::Delegate => match app.parsed_mix_id() {
                        Some(mix_id) => {
                            let session = app.session.clone();
                            let amount = app.delegations_form.amount.clone();
                            spawn_action(&action_tx, Activity::Delegate, async move {
                                session.delegate(mix_id, &amount).await
                            });
                        }
                        None => {
                            action_tx.send(Action::ActionFinished(
                                Activity::Delegate,
                                Err("enter a numeric mix id".to_string()),
                            ))?;
                        }
                    },
                    Action::UndelegateAll => {
                        let session = app.session.clone();
                        spawn_action(&action_tx, Activity::Undelegate, async move {
                            session.undelegate_all().await
                        });
                    }
                    Action::WithdrawRewards => {
                        let session = app.session.clone();
                        let validator = app.delegations_form.validator.clone();
                        spawn_action(&action_tx, Activity::Withdraw, async move {
                            session.withdraw_rewards(&validator).await
                        });
                    }
                    Action::CopyAddress => {
                        if let Some(address) = &app.snapshot.account {
                            if copy_to_clipboard(address) {
                                action_tx.send(Action::CopiedFeedback)?;
                            }
                        }
                    }
                    _ => {}
                }

                app.handle_action(action);
            }
        }

        // Check if we should quit
        if app.should_quit {
            break;
        }
    }

    // Cleanup
    events.stop();
    tui.exit()?;

    Ok(())
}

/// Send diagnostics to a file so they do not draw over the terminal UI
fn init_logging() -> Result<PathBuf> {
    let dir = Config::data_dir()?;
    fs::create_dir_all(&dir)?;
    let path = dir.join("nyxwallet.log");
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(path)
}

/// Fetch whatever the session is missing, then let the app re-read it
async fn refresh(session: &WalletSession, tx: &mpsc::UnboundedSender<Action>) {
    // failures are already logged by the session
    let _ = session.refresh_stale().await;
    let _ = tx.send(Action::SessionChanged);
}

fn spawn_action<F>(tx: &mpsc::UnboundedSender<Action>, activity: Activity, task: F)
where
    F: Future<Output = nyxwallet_lib::Result<Option<LogEntry>>> + Send + 'static,
{
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = task.await.map_err(|e| e.to_string());
        let _ = tx.send(Action::ActionFinished(activity, result));
    });
}

fn copy_to_clipboard(text: &str) -> bool {
    match arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text.to_string())) {
        Ok(()) => true,
        Err(err) => {
            log::warn!("clipboard unavailable: {err}");
            false
        }
    }
}

fn paste_from_clipboard() -> Option<Action> {
    let mut clipboard = arboard::Clipboard::new().ok()?;
    let text = clipboard.get_text().ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| Action::InputPaste(text.to_string()))
}

/// Convert terminal events to actions
fn handle_event(app: &App, event: Event) -> Vec<Action> {
    match event {
        Event::Tick => vec![Action::Tick],
        Event::Key(key) => handle_key_event(app, key).into_iter().collect(),
        Event::Resize(_, _) => vec![Action::Render],
    }
}

/// Handle keyboard events based on current screen
fn handle_key_event(app: &App, key: KeyEvent) -> Option<Action> {
    // Global key bindings
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(Action::Quit);
    }

    match app.screen {
        Screen::Home => handle_home_keys(app, key),
        Screen::Send => handle_send_keys(app, key),
        Screen::Delegations => handle_delegations_keys(app, key),
        Screen::Activity => handle_activity_keys(key),
    }
}

/// Editing keys shared by every text field
fn handle_input_keys(key: KeyEvent) -> Option<Action> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('v') if ctrl => paste_from_clipboard(),
        KeyCode::Char('u') if ctrl => Some(Action::InputClear),
        KeyCode::Char(_) if ctrl => None,
        KeyCode::Char(c) => Some(Action::InputChar(c)),
        KeyCode::Backspace => Some(Action::InputBackspace),
        _ => None,
    }
}

fn handle_home_keys(app: &App, key: KeyEvent) -> Option<Action> {
    if app.home_focus == HomeFocus::Mnemonic {
        return match key.code {
            KeyCode::Enter if !app.mnemonic_input.trim().is_empty() => Some(Action::Connect),
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Esc => Some(Action::NextField),
            _ => handle_input_keys(key),
        };
    }

    match key.code {
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Char('1') => Some(Action::NavigateSend),
        KeyCode::Char('2') => Some(Action::NavigateDelegations),
        KeyCode::Char('3') => Some(Action::NavigateActivity),
        KeyCode::Char('r') => Some(Action::Refresh),
        KeyCode::Char('c') => Some(Action::CopyAddress),
        KeyCode::Up | KeyCode::Char('k') => Some(Action::SelectPrev),
        KeyCode::Down | KeyCode::Char('j') => Some(Action::SelectNext),
        KeyCode::Tab | KeyCode::BackTab => Some(Action::NextField),
        KeyCode::Enter => match app.selected_index {
            0 => Some(Action::NavigateSend),
            1 => Some(Action::NavigateDelegations),
            2 => Some(Action::NavigateActivity),
            3 => Some(Action::Refresh),
            4 => Some(Action::Quit),
            _ => None,
        },
        KeyCode::Esc => Some(Action::ClearNotice),
        _ => None,
    }
}

fn handle_send_keys(app: &App, key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Esc => Some(Action::NavigateHome),
        KeyCode::Tab | KeyCode::Down => Some(Action::NextField),
        KeyCode::BackTab | KeyCode::Up => Some(Action::PrevField),
        KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::SendTokens)
        }
        KeyCode::Enter => match app.send_form.focused_field {
            SendField::SendButton => Some(Action::SendTokens),
            _ => Some(Action::NextField),
        },
        _ => handle_input_keys(key),
    }
}

fn handle_delegations_keys(app: &App, key: KeyEvent) -> Option<Action> {
    let field = app.delegations_form.focused_field;
    match key.code {
        KeyCode::Esc => return Some(Action::NavigateHome),
        KeyCode::Tab => return Some(Action::NextField),
        KeyCode::BackTab => return Some(Action::PrevField),
        _ => {}
    }

    if field == DelegationsField::Table {
        return match key.code {
            KeyCode::Up | KeyCode::Char('k') => Some(Action::SelectPrev),
            KeyCode::Down | KeyCode::Char('j') => Some(Action::SelectNext),
            KeyCode::Enter => Some(Action::UseSelectedMixId),
            KeyCode::Char('u') => Some(Action::UndelegateAll),
            KeyCode::Char('r') => Some(Action::Refresh),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Up => Some(Action::PrevField),
        KeyCode::Down => Some(Action::NextField),
        KeyCode::Enter => match field {
            DelegationsField::Validator => Some(Action::WithdrawRewards),
            _ => Some(Action::Delegate),
        },
        _ => handle_input_keys(key),
    }
}

fn handle_activity_keys(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Esc | KeyCode::Backspace => Some(Action::NavigateHome),
        KeyCode::Up | KeyCode::Char('k') => Some(Action::SelectPrev),
        KeyCode::Down | KeyCode::Char('j') => Some(Action::SelectNext),
        _ => None,
    }
}
