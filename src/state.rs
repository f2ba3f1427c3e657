//! Application state - records, cursors and the screen state machine

use serde::{Deserialize, Serialize};
use tui_dispatch_debug::debug::{ron_string, DebugSection, DebugState};

use crate::error::{DetailBoundary, SearchRejection};

pub const DEFAULT_PAGE_SIZE: usize = 25;
pub const DEFAULT_SEARCH_LIMIT: usize = 10;
pub const LOADING_TICK_MS: u64 = 90;

const SPINNER_FRAMES: [char; 4] = ['◐', '◓', '◑', '◒'];

/// One row of the catalog listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub name: String,
    pub detail_url: String,
}

/// One listing response: entries in server order plus the catalog size.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogPage {
    pub total: Option<u32>,
    pub entries: Vec<IndexEntry>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseStats {
    pub hp: u16,
    pub attack: u16,
    pub defense: u16,
    pub special_attack: u16,
    pub special_defense: u16,
    pub speed: u16,
}

impl BaseStats {
    pub fn total(&self) -> u32 {
        [
            self.hp,
            self.attack,
            self.defense,
            self.special_attack,
            self.special_defense,
            self.speed,
        ]
        .iter()
        .map(|value| u32::from(*value))
        .sum()
    }

    /// Label/value pairs in display order.
    pub fn rows(&self) -> [(&'static str, u16); 6] {
        [
            ("HP", self.hp),
            ("Attack", self.attack),
            ("Defense", self.defense),
            ("Sp. Atk", self.special_attack),
            ("Sp. Def", self.special_defense),
            ("Speed", self.speed),
        ]
    }
}

/// Everything needed to build a [`Record`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordFields {
    pub id: u32,
    pub name: String,
    pub species: String,
    pub sprite_url: Option<String>,
    pub shiny_sprite_url: Option<String>,
    pub types: Vec<String>,
    pub abilities_text: String,
    pub height_m: f32,
    pub weight_kg: f32,
    pub stats: BaseStats,
}

/// A fully resolved creature. Immutable once built; `stat_total` always
/// equals the sum of the six base stats.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredRecord")]
pub struct Record {
    pub id: u32,
    pub name: String,
    pub species: String,
    pub sprite_url: Option<String>,
    pub shiny_sprite_url: Option<String>,
    pub types: Vec<String>,
    pub abilities_text: String,
    pub height_m: f32,
    pub weight_kg: f32,
    stats: BaseStats,
    stat_total: u32,
}

#[derive(Deserialize)]
struct StoredRecord {
    #[serde(flatten)]
    fields: RecordFields,
    stat_total: u32,
}

impl TryFrom<StoredRecord> for Record {
    type Error = String;

    fn try_from(stored: StoredRecord) -> Result<Self, Self::Error> {
        let record = Record::new(stored.fields);
        if record.stat_total != stored.stat_total {
            return Err(format!(
                "stat_total {} of #{} does not match its stats ({})",
                stored.stat_total, record.id, record.stat_total
            ));
        }
        Ok(record)
    }
}

impl Record {
    pub fn new(fields: RecordFields) -> Self {
        let stat_total = fields.stats.total();
        Self {
            id: fields.id,
            name: fields.name,
            species: fields.species,
            sprite_url: fields.sprite_url,
            shiny_sprite_url: fields.shiny_sprite_url,
            types: fields.types,
            abilities_text: fields.abilities_text,
            height_m: fields.height_m,
            weight_kg: fields.weight_kg,
            stats: fields.stats,
            stat_total,
        }
    }

    pub fn stats(&self) -> &BaseStats {
        &self.stats
    }

    pub fn stat_total(&self) -> u32 {
        self.stat_total
    }

    pub fn display_name(&self) -> String {
        capitalize(&self.name)
    }

    pub fn primary_type(&self) -> Option<&str> {
        self.types.first().map(String::as_str)
    }
}

pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Outcome of resolving a page of index entries. Failed entries are left
/// out of `records` and counted in `dropped`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedBatch {
    pub records: Vec<Record>,
    pub dropped: usize,
}

/// A completed page load, handed back to the reducer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoadedPage {
    pub offset: usize,
    pub limit: usize,
    /// Number of index entries the listing returned.
    pub requested: usize,
    pub total: Option<u32>,
    pub records: Vec<Record>,
    pub dropped: usize,
}

/// The loaded record collection and its cursors.
///
/// `records` only ever grows. `visible_count <= records.len()` and the
/// detail cursor, when set, indexes into `records`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    records: Vec<Record>,
    next_page_offset: usize,
    visible_count: usize,
    active_detail_index: Option<usize>,
    search_query: Option<String>,
    remote_total: Option<u32>,
    remote_exhausted: bool,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn next_page_offset(&self) -> usize {
        self.next_page_offset
    }

    pub fn visible_count(&self) -> usize {
        self.visible_count
    }

    pub fn active_detail_index(&self) -> Option<usize> {
        self.active_detail_index
    }

    pub fn search_query(&self) -> Option<&str> {
        self.search_query.as_deref()
    }

    pub fn remote_total(&self) -> Option<u32> {
        self.remote_total
    }

    /// Appends in argument order. Duplicates are kept.
    pub fn append_records(&mut self, new_records: impl IntoIterator<Item = Record>) {
        self.records.extend(new_records);
    }

    /// Records a completed page: appends its records and moves the remote
    /// cursor past every entry the listing returned, dropped ones included.
    pub fn apply_page(&mut self, page: LoadedPage) {
        let end = page.offset + page.requested;
        self.next_page_offset = self.next_page_offset.max(end);
        if page.total.is_some() {
            self.remote_total = page.total;
        }
        if page.total.is_none() && page.requested < page.limit {
            self.remote_exhausted = true;
        }
        self.append_records(page.records);
    }

    /// Reveals the next slice of already-loaded records.
    pub fn advance_page(&mut self, page_size: usize) -> &[Record] {
        let start = self.visible_count;
        let end = (start + page_size).min(self.records.len());
        self.visible_count = end;
        &self.records[start..end]
    }

    pub fn visible(&self) -> &[Record] {
        &self.records[..self.visible_count]
    }

    /// Loaded but not yet revealed.
    pub fn has_hidden(&self) -> bool {
        self.visible_count < self.records.len()
    }

    pub fn remote_has_more(&self) -> bool {
        if self.remote_exhausted {
            return false;
        }
        match self.remote_total {
            Some(total) => self.next_page_offset < total as usize,
            None => true,
        }
    }

    pub fn has_more(&self) -> bool {
        self.has_hidden() || self.remote_has_more()
    }

    /// Opens the record with `id`. Unknown ids leave the cursor alone.
    pub fn set_detail_cursor(&mut self, id: u32) -> bool {
        match self.records.iter().position(|record| record.id == id) {
            Some(index) => {
                self.active_detail_index = Some(index);
                true
            }
            None => false,
        }
    }

    pub fn clear_detail_cursor(&mut self) {
        self.active_detail_index = None;
    }

    /// Moves the detail cursor forward. `None` when no record is open.
    pub fn next_detail(&mut self) -> Option<Result<usize, DetailBoundary>> {
        let index = self.active_detail_index?;
        if index + 1 >= self.records.len() {
            return Some(Err(DetailBoundary::AtEnd));
        }
        self.active_detail_index = Some(index + 1);
        Some(Ok(index + 1))
    }

    pub fn previous_detail(&mut self) -> Option<Result<usize, DetailBoundary>> {
        let index = self.active_detail_index?;
        if index == 0 {
            return Some(Err(DetailBoundary::AtStart));
        }
        self.active_detail_index = Some(index - 1);
        Some(Ok(index - 1))
    }

    pub fn active_record(&self) -> Option<&Record> {
        self.active_detail_index
            .and_then(|index| self.records.get(index))
    }

    /// `(index + 1, loaded count)` for the detail counter.
    pub fn detail_position(&self) -> Option<(usize, usize)> {
        self.active_detail_index
            .map(|index| (index + 1, self.records.len()))
    }

    pub fn set_search_query(&mut self, query: String) {
        self.search_query = Some(query);
    }

    /// Back to the first page of the unfiltered view. Records are kept.
    pub fn reset_to_start(&mut self, page_size: usize) {
        self.visible_count = page_size.min(self.records.len());
        self.search_query = None;
    }

    /// Indices of records whose name contains `needle`, in load order.
    pub fn matching_indices(&self, needle: &str, cap: usize) -> Vec<usize> {
        let needle = needle.to_lowercase();
        self.records
            .iter()
            .enumerate()
            .filter(|(_, record)| record.name.to_lowercase().contains(&needle))
            .map(|(index, _)| index)
            .take(cap)
            .collect()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Screen {
    #[default]
    Loading,
    Grid,
    SearchResults,
    Detail,
    Empty,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetailTab {
    #[default]
    About,
    BaseStats,
    Shiny,
}

impl DetailTab {
    pub const ALL: [DetailTab; 3] = [DetailTab::About, DetailTab::BaseStats, DetailTab::Shiny];

    pub fn title(&self) -> &'static str {
        match self {
            DetailTab::About => "About",
            DetailTab::BaseStats => "Base Stats",
            DetailTab::Shiny => "Shiny",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            DetailTab::About => 0,
            DetailTab::BaseStats => 1,
            DetailTab::Shiny => 2,
        }
    }

    pub fn next(&self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(&self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Blocking message shown over everything until dismissed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Notice {
    Validation(SearchRejection),
    Boundary(DetailBoundary),
    LoadFailed { message: String },
}

impl Notice {
    pub fn title(&self) -> &'static str {
        match self {
            Notice::Validation(_) => "SEARCH",
            Notice::Boundary(_) => "POKEDEX",
            Notice::LoadFailed { .. } => "LOAD FAILED",
        }
    }

    pub fn text(&self) -> String {
        match self {
            Notice::Validation(rejection) => rejection.to_string(),
            Notice::Boundary(boundary) => boundary.to_string(),
            Notice::LoadFailed { message } => message.clone(),
        }
    }

    pub fn can_retry(&self) -> bool {
        matches!(self, Notice::LoadFailed { .. })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchInput {
    pub active: bool,
    pub query: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowseSettings {
    pub page_size: usize,
    pub search_limit: usize,
}

impl Default for BrowseSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AppState {
    pub terminal_size: (u16, u16),
    pub settings: BrowseSettings,
    pub view: ViewState,
    pub screen: Screen,
    /// Where `DetailClose` and finished loads go back to.
    pub return_screen: Screen,
    pub search: SearchInput,
    pub search_matches: Vec<usize>,
    pub selected_card: usize,
    pub detail_tab: DetailTab,
    pub notice: Option<Notice>,
    pub fetch_in_flight: bool,
    pub advance_after_load: bool,
    pub message: Option<String>,
    pub tick: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(BrowseSettings::default())
    }
}

impl AppState {
    pub fn new(settings: BrowseSettings) -> Self {
        Self {
            terminal_size: (80, 24),
            settings,
            view: ViewState::new(),
            screen: Screen::Loading,
            return_screen: Screen::Grid,
            search: SearchInput::default(),
            search_matches: Vec::new(),
            selected_card: 0,
            detail_tab: DetailTab::About,
            notice: None,
            fetch_in_flight: false,
            advance_after_load: false,
            message: None,
            tick: 0,
        }
    }

    /// The list screen underneath the detail overlay.
    pub fn browse_screen(&self) -> Screen {
        if self.screen == Screen::Detail {
            self.return_screen
        } else {
            self.screen
        }
    }

    /// The exact card subset the list should show, in order.
    pub fn visible_records(&self) -> Vec<&Record> {
        match self.browse_screen() {
            Screen::Grid => self.view.visible().iter().collect(),
            Screen::SearchResults => self
                .search_matches
                .iter()
                .filter_map(|index| self.view.records().get(*index))
                .collect(),
            Screen::Loading | Screen::Empty | Screen::Detail => Vec::new(),
        }
    }

    pub fn selected_record(&self) -> Option<&Record> {
        self.visible_records().get(self.selected_card).copied()
    }

    pub fn detail_record(&self) -> Option<&Record> {
        if self.screen != Screen::Detail {
            return None;
        }
        self.view.active_record()
    }

    pub fn detail_position(&self) -> Option<(usize, usize)> {
        if self.screen != Screen::Detail {
            return None;
        }
        self.view.detail_position()
    }

    pub fn clamp_selected_card(&mut self) {
        let len = self.visible_records().len();
        self.selected_card = self.selected_card.min(len.saturating_sub(1));
    }

    pub fn can_load_more(&self) -> bool {
        self.screen == Screen::Grid && !self.fetch_in_flight && self.view.has_more()
    }

    pub fn can_search(&self) -> bool {
        self.notice.is_none()
            && matches!(
                self.screen,
                Screen::Grid | Screen::SearchResults | Screen::Empty
            )
    }

    pub fn spinner_frame(&self) -> char {
        SPINNER_FRAMES[(self.tick as usize) % SPINNER_FRAMES.len()]
    }
}

impl DebugState for AppState {
    fn debug_sections(&self) -> Vec<DebugSection> {
        vec![
            DebugSection::new("Records")
                .entry("loaded", ron_string(&self.view.len()))
                .entry("visible", ron_string(&self.view.visible_count()))
                .entry("next_offset", ron_string(&self.view.next_page_offset()))
                .entry("remote_total", ron_string(&self.view.remote_total()))
                .entry("detail", ron_string(&self.view.active_detail_index())),
            DebugSection::new("View")
                .entry("screen", ron_string(&self.screen))
                .entry("return_screen", ron_string(&self.return_screen))
                .entry("selected", ron_string(&self.selected_card))
                .entry("detail_tab", ron_string(&self.detail_tab))
                .entry("search", ron_string(&self.view.search_query()))
                .entry("search_input", ron_string(&self.search.query))
                .entry("matches", ron_string(&self.search_matches.len())),
            DebugSection::new("Status")
                .entry("fetch_in_flight", ron_string(&self.fetch_in_flight))
                .entry("advance_after_load", ron_string(&self.advance_after_load))
                .entry("notice", ron_string(&self.notice))
                .entry("message", ron_string(&self.message)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u32, name: &str) -> Record {
        Record::new(RecordFields {
            id,
            name: name.to_string(),
            species: name.to_string(),
            types: vec!["normal".to_string()],
            stats: BaseStats {
                hp: 45,
                attack: 49,
                defense: 49,
                special_attack: 65,
                special_defense: 65,
                speed: 45,
            },
            ..Default::default()
        })
    }

    fn loaded(count: u32) -> ViewState {
        let mut view = ViewState::new();
        view.append_records((1..=count).map(|id| record(id, &format!("mon-{id}"))));
        view
    }

    #[test]
    fn stat_total_is_sum_of_stats() {
        let record = record(1, "bulbasaur");
        assert_eq!(record.stat_total(), 318);
        assert_eq!(record.stat_total(), record.stats().total());
    }

    #[test]
    fn deserializing_mismatched_total_is_rejected() {
        let good = serde_json::to_value(record(1, "bulbasaur")).unwrap();
        let roundtrip: Record = serde_json::from_value(good.clone()).unwrap();
        assert_eq!(roundtrip.stat_total(), 318);

        let mut bad = good;
        bad["stat_total"] = serde_json::json!(999);
        assert!(serde_json::from_value::<Record>(bad).is_err());
    }

    #[test]
    fn advance_page_never_exceeds_page_size() {
        let mut view = loaded(60);
        let mut seen = 0;
        loop {
            let slice = view.advance_page(25).len();
            assert!(slice <= 25);
            if slice == 0 {
                break;
            }
            seen += slice;
        }
        assert_eq!(seen, 60);
        assert_eq!(view.visible_count(), 60);
    }

    #[test]
    fn advance_page_returns_short_tail() {
        let mut view = loaded(30);
        assert_eq!(view.advance_page(25).len(), 25);
        let tail = view.advance_page(25);
        assert_eq!(tail.len(), 5);
        assert_eq!(tail[0].id, 26);
    }

    #[test]
    fn first_page_of_large_catalog_has_more() {
        let mut view = ViewState::new();
        view.apply_page(LoadedPage {
            offset: 0,
            limit: 25,
            requested: 25,
            total: Some(1302),
            records: (1..=25).map(|id| record(id, "mon")).collect(),
            dropped: 0,
        });
        view.advance_page(25);

        assert_eq!(view.len(), 25);
        assert_eq!(view.visible_count(), 25);
        assert_eq!(view.next_page_offset(), 25);
        assert!(view.has_more());
    }

    #[test]
    fn dropped_entries_still_move_the_remote_cursor() {
        let mut view = ViewState::new();
        view.apply_page(LoadedPage {
            offset: 0,
            limit: 25,
            requested: 25,
            total: Some(25),
            records: (1..=23).map(|id| record(id, "mon")).collect(),
            dropped: 2,
        });
        view.advance_page(25);

        assert_eq!(view.next_page_offset(), 25);
        assert!(!view.remote_has_more());
        assert!(!view.has_more());
    }

    #[test]
    fn short_page_without_total_exhausts_catalog() {
        let mut view = ViewState::new();
        view.apply_page(LoadedPage {
            offset: 0,
            limit: 25,
            requested: 4,
            total: None,
            records: (1..=4).map(|id| record(id, "mon")).collect(),
            dropped: 0,
        });
        assert!(view.has_hidden());
        view.advance_page(25);
        assert!(!view.has_more());
    }

    #[test]
    fn hidden_records_count_as_more() {
        let mut view = loaded(50);
        view.advance_page(25);
        view.apply_page(LoadedPage {
            offset: 0,
            limit: 50,
            requested: 50,
            total: Some(50),
            records: Vec::new(),
            dropped: 0,
        });
        assert!(!view.remote_has_more());
        assert!(view.has_more());
    }

    #[test]
    fn detail_cursor_ignores_unknown_id() {
        let mut view = loaded(3);
        assert!(!view.set_detail_cursor(99));
        assert_eq!(view.active_detail_index(), None);

        assert!(view.set_detail_cursor(2));
        assert_eq!(view.active_detail_index(), Some(1));
        assert!(!view.set_detail_cursor(99));
        assert_eq!(view.active_detail_index(), Some(1));
    }

    #[test]
    fn next_detail_at_end_keeps_cursor() {
        let mut view = loaded(3);
        view.set_detail_cursor(3);
        assert_eq!(view.next_detail(), Some(Err(DetailBoundary::AtEnd)));
        assert_eq!(view.active_detail_index(), Some(2));
    }

    #[test]
    fn previous_detail_at_start_keeps_cursor() {
        let mut view = loaded(3);
        view.set_detail_cursor(1);
        assert_eq!(view.previous_detail(), Some(Err(DetailBoundary::AtStart)));
        assert_eq!(view.active_detail_index(), Some(0));
        view.set_detail_cursor(2);
        assert_eq!(view.previous_detail(), Some(Ok(0)));
    }

    #[test]
    fn navigation_without_open_record_is_refused() {
        let mut view = loaded(3);
        assert_eq!(view.next_detail(), None);
        assert_eq!(view.previous_detail(), None);
    }

    #[test]
    fn detail_position_counts_loaded_records() {
        let mut view = loaded(40);
        view.advance_page(25);
        view.set_detail_cursor(30);
        assert_eq!(view.detail_position(), Some((30, 40)));
    }

    #[test]
    fn reset_keeps_records() {
        let mut view = loaded(75);
        view.advance_page(25);
        view.advance_page(25);
        view.advance_page(25);
        view.set_search_query("char".to_string());

        view.reset_to_start(25);
        assert_eq!(view.visible_count(), 25);
        assert_eq!(view.len(), 75);
        assert_eq!(view.search_query(), None);
    }

    #[test]
    fn reset_with_few_records_respects_len() {
        let mut view = loaded(7);
        view.advance_page(25);
        view.reset_to_start(25);
        assert_eq!(view.visible_count(), 7);
    }

    #[test]
    fn matching_is_case_insensitive_and_capped() {
        let mut view = ViewState::new();
        view.append_records([
            record(4, "charmander"),
            record(5, "Charmeleon"),
            record(6, "charizard"),
            record(7, "squirtle"),
        ]);
        assert_eq!(view.matching_indices("CHAR", 10), vec![0, 1, 2]);
        assert_eq!(view.matching_indices("char", 2), vec![0, 1]);
        assert!(view.matching_indices("pika", 10).is_empty());
    }

    #[test]
    fn detail_tabs_cycle() {
        assert_eq!(DetailTab::About.next(), DetailTab::BaseStats);
        assert_eq!(DetailTab::Shiny.next(), DetailTab::About);
        assert_eq!(DetailTab::About.prev(), DetailTab::Shiny);
    }

    #[test]
    fn capitalize_first_letter() {
        assert_eq!(capitalize("bulbasaur"), "Bulbasaur");
        assert_eq!(capitalize(""), "");
    }
}
