use nyxwallet_lib::{Activity, LogEntry};

/// Actions that can be dispatched to update application state (Elm architecture)
#[derive(Debug, Clone)]
pub enum Action {
    // Navigation
    NavigateHome,
    NavigateSend,
    NavigateDelegations,
    NavigateActivity,

    // Focus and list selection
    NextField,
    PrevField,
    SelectPrev,
    SelectNext,

    // Application lifecycle
    Quit,
    Tick,
    Render,

    // Session
    Connect,
    ConnectFinished(Result<(), String>),
    Refresh,
    SessionChanged,

    // Wallet actions
    SendTokens,
    Delegate,
    UndelegateAll,
    WithdrawRewards,
    ActionFinished(Activity, Result<Option<LogEntry>, String>),

    // Text input
    InputChar(char),
    InputBackspace,
    InputClear,
    InputPaste(String),

    // Delegation table
    UseSelectedMixId,

    // Notices
    ClearNotice,

    // Clipboard
    CopyAddress,
    CopiedFeedback,
}
