use serde::{Deserialize, Serialize};

use crate::state::{DetailTab, LoadedPage};

#[derive(tui_dispatch::Action, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[action(infer_categories)]
pub enum Action {
    Init,

    PageDidLoad(LoadedPage),
    PageDidError(String),
    LoadMore,
    Retry,
    ResetToStart,

    CardSelect(usize),

    SearchStart,
    SearchCancel,
    SearchSubmit,
    SearchInput(char),
    SearchBackspace,

    DetailOpen(u32),
    DetailClose,
    DetailNext,
    DetailPrev,
    DetailTabNext,
    DetailTabPrev,
    DetailTabSet(DetailTab),

    NoticeDismiss,

    UiTerminalResize(u16, u16),
    Tick,
    Quit,
}
