//! Reducer - the screen state machine: (state, action) -> DispatchResult

use tui_dispatch::DispatchResult;

use crate::action::Action;
use crate::effect::Effect;
use crate::error::{validate_query, DetailBoundary};
use crate::state::{AppState, Notice, Screen};

pub fn reducer(state: &mut AppState, action: Action) -> DispatchResult<Effect> {
    match action {
        Action::Init => {
            if state.fetch_in_flight {
                return DispatchResult::unchanged();
            }
            state.screen = Screen::Loading;
            state.return_screen = Screen::Grid;
            state.message = None;
            request_page(state)
        }

        Action::PageDidLoad(page) => {
            state.fetch_in_flight = false;
            let dropped = page.dropped;
            state.view.apply_page(page);
            state.view.advance_page(state.settings.page_size);
            state.message = (dropped > 0)
                .then(|| format!("{dropped} Pokémon could not be loaded and were skipped."));
            if state.screen == Screen::Loading {
                state.screen = state.return_screen;
            }
            state.clamp_selected_card();
            if state.advance_after_load {
                state.advance_after_load = false;
                if state.screen == Screen::Detail {
                    match state.view.next_detail() {
                        Some(Err(DetailBoundary::AtEnd)) if state.view.remote_has_more() => {
                            // Every entry on that page was dropped; keep walking.
                            state.advance_after_load = true;
                            return request_page(state);
                        }
                        Some(Err(boundary)) => {
                            state.notice = Some(Notice::Boundary(boundary));
                        }
                        Some(Ok(_)) | None => {}
                    }
                }
            }
            DispatchResult::changed()
        }

        Action::PageDidError(error) => {
            state.fetch_in_flight = false;
            state.advance_after_load = false;
            if state.screen == Screen::Loading {
                state.screen = state.return_screen;
            }
            state.notice = Some(Notice::LoadFailed {
                message: format!("Could not load Pokémon: {error}"),
            });
            DispatchResult::changed()
        }

        Action::Retry => {
            let Some(notice) = state.notice.as_ref() else {
                return DispatchResult::unchanged();
            };
            if !notice.can_retry() {
                return DispatchResult::unchanged();
            }
            state.notice = None;
            if state.fetch_in_flight {
                return DispatchResult::changed();
            }
            if state.screen == Screen::Detail {
                state.advance_after_load = true;
            } else {
                state.screen = Screen::Loading;
                state.return_screen = Screen::Grid;
            }
            request_page(state)
        }

        Action::LoadMore => {
            if state.screen != Screen::Grid || state.fetch_in_flight || state.notice.is_some() {
                return DispatchResult::unchanged();
            }
            if state.view.has_hidden() {
                state.view.advance_page(state.settings.page_size);
                return DispatchResult::changed();
            }
            if !state.view.remote_has_more() {
                state.message = Some("All Pokémon are loaded.".to_string());
                return DispatchResult::changed();
            }
            state.screen = Screen::Loading;
            state.return_screen = Screen::Grid;
            request_page(state)
        }

        Action::ResetToStart => {
            if !matches!(
                state.screen,
                Screen::Grid | Screen::SearchResults | Screen::Empty
            ) {
                return DispatchResult::unchanged();
            }
            state.view.reset_to_start(state.settings.page_size);
            state.search_matches.clear();
            state.search.active = false;
            state.search.query.clear();
            state.selected_card = 0;
            state.screen = Screen::Grid;
            DispatchResult::changed()
        }

        Action::CardSelect(index) => {
            if index >= state.visible_records().len() || index == state.selected_card {
                return DispatchResult::unchanged();
            }
            state.selected_card = index;
            DispatchResult::changed()
        }

        Action::SearchStart => {
            if !state.can_search() {
                return DispatchResult::unchanged();
            }
            state.search.active = true;
            state.search.query.clear();
            DispatchResult::changed()
        }

        Action::SearchCancel => {
            if !state.search.active {
                return DispatchResult::unchanged();
            }
            state.search.active = false;
            state.search.query.clear();
            DispatchResult::changed()
        }

        Action::SearchInput(ch) => {
            if !state.search.active {
                return DispatchResult::unchanged();
            }
            state.search.query.push(ch);
            DispatchResult::changed()
        }

        Action::SearchBackspace => {
            if !state.search.active || state.search.query.pop().is_none() {
                return DispatchResult::unchanged();
            }
            DispatchResult::changed()
        }

        Action::SearchSubmit => {
            if !state.search.active {
                return DispatchResult::unchanged();
            }
            match validate_query(&state.search.query) {
                Err(rejection) => {
                    state.notice = Some(Notice::Validation(rejection));
                }
                Ok(query) => {
                    state.search.active = false;
                    state.search_matches = state
                        .view
                        .matching_indices(&query, state.settings.search_limit);
                    state.view.set_search_query(query);
                    state.selected_card = 0;
                    state.screen = if state.search_matches.is_empty() {
                        Screen::Empty
                    } else {
                        Screen::SearchResults
                    };
                }
            }
            DispatchResult::changed()
        }

        Action::DetailOpen(id) => {
            if !matches!(state.screen, Screen::Grid | Screen::SearchResults) {
                return DispatchResult::unchanged();
            }
            if !state.view.set_detail_cursor(id) {
                return DispatchResult::unchanged();
            }
            state.return_screen = state.screen;
            state.screen = Screen::Detail;
            state.detail_tab = Default::default();
            DispatchResult::changed()
        }

        Action::DetailClose => {
            if state.screen != Screen::Detail {
                return DispatchResult::unchanged();
            }
            state.view.clear_detail_cursor();
            state.advance_after_load = false;
            state.screen = state.return_screen;
            state.clamp_selected_card();
            DispatchResult::changed()
        }

        Action::DetailNext => {
            if !detail_navigable(state) {
                return DispatchResult::unchanged();
            }
            match state.view.next_detail() {
                None => DispatchResult::unchanged(),
                Some(Ok(_)) => DispatchResult::changed(),
                Some(Err(DetailBoundary::AtEnd)) if state.view.remote_has_more() => {
                    state.advance_after_load = true;
                    request_page(state)
                }
                Some(Err(boundary)) => raise_boundary(state, boundary),
            }
        }

        Action::DetailPrev => {
            if !detail_navigable(state) {
                return DispatchResult::unchanged();
            }
            match state.view.previous_detail() {
                None => DispatchResult::unchanged(),
                Some(Ok(_)) => DispatchResult::changed(),
                Some(Err(boundary)) => raise_boundary(state, boundary),
            }
        }

        Action::DetailTabNext => set_detail_tab(state, state.detail_tab.next()),
        Action::DetailTabPrev => set_detail_tab(state, state.detail_tab.prev()),
        Action::DetailTabSet(tab) => set_detail_tab(state, tab),

        Action::NoticeDismiss => {
            if state.notice.take().is_none() {
                return DispatchResult::unchanged();
            }
            DispatchResult::changed()
        }

        Action::UiTerminalResize(width, height) => {
            state.terminal_size = (width, height);
            DispatchResult::changed()
        }

        Action::Tick => {
            if !state.fetch_in_flight {
                return DispatchResult::unchanged();
            }
            state.tick = state.tick.wrapping_add(1);
            DispatchResult::changed()
        }

        Action::Quit => DispatchResult::unchanged(),
    }
}

fn request_page(state: &mut AppState) -> DispatchResult<Effect> {
    state.fetch_in_flight = true;
    state.tick = 0;
    DispatchResult::changed_with(Effect::FetchPage {
        offset: state.view.next_page_offset(),
        limit: state.settings.page_size,
    })
}

/// Next/prev wait while a page that would extend the list is loading.
fn detail_navigable(state: &AppState) -> bool {
    state.screen == Screen::Detail && state.notice.is_none() && !state.fetch_in_flight
}

fn raise_boundary(state: &mut AppState, boundary: DetailBoundary) -> DispatchResult<Effect> {
    state.notice = Some(Notice::Boundary(boundary));
    DispatchResult::changed()
}

fn set_detail_tab(state: &mut AppState, tab: crate::state::DetailTab) -> DispatchResult<Effect> {
    if state.screen != Screen::Detail || state.detail_tab == tab {
        return DispatchResult::unchanged();
    }
    state.detail_tab = tab;
    DispatchResult::changed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SearchRejection;
    use crate::state::{BaseStats, DetailTab, LoadedPage, Record, RecordFields};

    fn record(id: u32, name: &str) -> Record {
        Record::new(RecordFields {
            id,
            name: name.to_string(),
            species: name.to_string(),
            stats: BaseStats {
                hp: 39,
                attack: 52,
                defense: 43,
                special_attack: 60,
                special_defense: 50,
                speed: 65,
            },
            ..Default::default()
        })
    }

    fn page(offset: usize, names: &[&str], total: u32) -> LoadedPage {
        LoadedPage {
            offset,
            limit: 25,
            requested: names.len(),
            total: Some(total),
            records: names
                .iter()
                .enumerate()
                .map(|(i, name)| record((offset + i + 1) as u32, name))
                .collect(),
            dropped: 0,
        }
    }

    fn numbered(offset: usize, count: usize) -> Vec<String> {
        (offset..offset + count).map(|i| format!("mon-{i}")).collect()
    }

    fn loaded_state(names: &[&str], total: u32) -> AppState {
        let mut state = AppState::default();
        reducer(&mut state, Action::Init);
        reducer(&mut state, Action::PageDidLoad(page(0, names, total)));
        state
    }

    fn submit_search(state: &mut AppState, query: &str) -> DispatchResult<Effect> {
        reducer(state, Action::SearchStart);
        for ch in query.chars() {
            reducer(state, Action::SearchInput(ch));
        }
        reducer(state, Action::SearchSubmit)
    }

    #[test]
    fn init_requests_first_page() {
        let mut state = AppState::default();
        let result = reducer(&mut state, Action::Init);

        assert!(result.changed);
        assert_eq!(state.screen, Screen::Loading);
        assert!(state.fetch_in_flight);
        assert_eq!(
            result.effects,
            vec![Effect::FetchPage {
                offset: 0,
                limit: 25
            }]
        );
    }

    #[test]
    fn first_page_of_large_catalog() {
        let names = numbered(0, 25);
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let state = loaded_state(&names, 1302);

        assert_eq!(state.screen, Screen::Grid);
        assert_eq!(state.view.len(), 25);
        assert_eq!(state.view.visible_count(), 25);
        assert!(state.view.has_more());
        assert!(state.can_load_more());
        assert_eq!(state.visible_records().len(), 25);
    }

    #[test]
    fn load_more_is_not_reentrant() {
        let mut state = loaded_state(&["bulbasaur"], 1302);
        let first = reducer(&mut state, Action::LoadMore);
        assert_eq!(first.effects.len(), 1);
        assert_eq!(state.screen, Screen::Loading);

        let second = reducer(&mut state, Action::LoadMore);
        assert!(!second.changed);
        assert!(second.effects.is_empty());
    }

    #[test]
    fn load_more_requests_next_offset() {
        let names = numbered(0, 25);
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut state = loaded_state(&names, 1302);

        let result = reducer(&mut state, Action::LoadMore);
        assert_eq!(
            result.effects,
            vec![Effect::FetchPage {
                offset: 25,
                limit: 25
            }]
        );
    }

    #[test]
    fn load_more_reveals_hidden_records_before_fetching() {
        let names = numbered(0, 25);
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut state = loaded_state(&names, 1302);
        reducer(&mut state, Action::LoadMore);
        let more = numbered(25, 25);
        let more: Vec<&str> = more.iter().map(String::as_str).collect();
        reducer(&mut state, Action::PageDidLoad(page(25, &more, 1302)));
        assert_eq!(state.view.visible_count(), 50);

        reducer(&mut state, Action::ResetToStart);
        assert_eq!(state.view.visible_count(), 25);

        let result = reducer(&mut state, Action::LoadMore);
        assert!(result.changed);
        assert!(result.effects.is_empty());
        assert_eq!(state.screen, Screen::Grid);
        assert_eq!(state.view.visible_count(), 50);
    }

    #[test]
    fn load_more_when_exhausted_only_informs() {
        let mut state = loaded_state(&["bulbasaur", "ivysaur"], 2);
        let result = reducer(&mut state, Action::LoadMore);
        assert!(result.effects.is_empty());
        assert_eq!(state.screen, Screen::Grid);
        assert!(state.message.is_some());
    }

    #[test]
    fn page_error_leaves_records_untouched() {
        let mut state = loaded_state(&["bulbasaur", "ivysaur"], 1302);
        reducer(&mut state, Action::LoadMore);
        let before = state.view.clone();

        reducer(&mut state, Action::PageDidError("timeout".into()));

        assert_eq!(state.view, before);
        assert_eq!(state.screen, Screen::Grid);
        assert!(!state.fetch_in_flight);
        assert!(matches!(state.notice, Some(Notice::LoadFailed { .. })));
    }

    #[test]
    fn retry_reissues_failed_page() {
        let mut state = AppState::default();
        reducer(&mut state, Action::Init);
        reducer(&mut state, Action::PageDidError("offline".into()));

        let result = reducer(&mut state, Action::Retry);
        assert!(state.notice.is_none());
        assert_eq!(state.screen, Screen::Loading);
        assert_eq!(
            result.effects,
            vec![Effect::FetchPage {
                offset: 0,
                limit: 25
            }]
        );
    }

    #[test]
    fn retry_ignored_for_other_notices() {
        let mut state = loaded_state(&["bulbasaur"], 1);
        submit_search(&mut state, "b");
        let result = reducer(&mut state, Action::Retry);
        assert!(!result.changed);
        assert!(state.notice.is_some());
    }

    #[test]
    fn dropped_entries_reported_in_status() {
        let mut state = AppState::default();
        reducer(&mut state, Action::Init);
        let mut loaded = page(0, &["bulbasaur"], 1302);
        loaded.requested = 3;
        loaded.dropped = 2;
        reducer(&mut state, Action::PageDidLoad(loaded));

        assert_eq!(state.view.len(), 1);
        assert_eq!(state.view.next_page_offset(), 3);
        assert!(state.message.as_deref().unwrap_or_default().contains('2'));
    }

    #[test]
    fn short_query_is_rejected_without_touching_view() {
        let mut state = loaded_state(&["charmander", "squirtle"], 1302);
        let before = state.view.clone();

        submit_search(&mut state, " ch ");

        assert_eq!(
            state.notice,
            Some(Notice::Validation(SearchRejection::TooShort { min: 3 }))
        );
        assert_eq!(state.view, before);
        assert_eq!(state.screen, Screen::Grid);
    }

    #[test]
    fn empty_query_is_rejected() {
        let mut state = loaded_state(&["charmander"], 1302);
        submit_search(&mut state, "");
        assert_eq!(
            state.notice,
            Some(Notice::Validation(SearchRejection::Empty))
        );
    }

    #[test]
    fn search_filters_loaded_records_in_order() {
        let mut state = loaded_state(&["charmander", "charmeleon", "charizard", "squirtle"], 1302);
        submit_search(&mut state, "CHAR");

        assert_eq!(state.screen, Screen::SearchResults);
        let names: Vec<&str> = state
            .visible_records()
            .iter()
            .map(|record| record.name.as_str())
            .collect();
        assert_eq!(names, vec!["charmander", "charmeleon", "charizard"]);
        assert_eq!(state.view.search_query(), Some("char"));
    }

    #[test]
    fn search_is_capped() {
        let names = numbered(0, 25);
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut state = loaded_state(&names, 1302);
        submit_search(&mut state, "mon");
        assert_eq!(state.visible_records().len(), 10);
    }

    #[test]
    fn no_matches_goes_empty_and_keeps_records() {
        let mut state = loaded_state(&["bulbasaur", "ivysaur"], 1302);
        submit_search(&mut state, "pikachu");

        assert_eq!(state.screen, Screen::Empty);
        assert_eq!(state.view.len(), 2);
        assert!(state.visible_records().is_empty());
    }

    #[test]
    fn reset_from_search_restores_grid() {
        let names = numbered(0, 25);
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut state = loaded_state(&names, 1302);
        reducer(&mut state, Action::LoadMore);
        let more = numbered(25, 25);
        let more: Vec<&str> = more.iter().map(String::as_str).collect();
        reducer(&mut state, Action::PageDidLoad(page(25, &more, 1302)));
        submit_search(&mut state, "mon-3");
        assert_eq!(state.screen, Screen::SearchResults);

        reducer(&mut state, Action::ResetToStart);

        assert_eq!(state.screen, Screen::Grid);
        assert_eq!(state.view.visible_count(), 25);
        assert_eq!(state.view.len(), 50);
        assert_eq!(state.view.search_query(), None);
        assert!(state.search_matches.is_empty());
    }

    #[test]
    fn open_and_close_detail_returns_to_search_results() {
        let mut state = loaded_state(&["charmander", "charmeleon", "squirtle"], 1302);
        submit_search(&mut state, "char");

        reducer(&mut state, Action::DetailOpen(2));
        assert_eq!(state.screen, Screen::Detail);
        assert_eq!(state.detail_position(), Some((2, 3)));
        assert_eq!(state.detail_record().map(|r| r.id), Some(2));

        reducer(&mut state, Action::DetailClose);
        assert_eq!(state.screen, Screen::SearchResults);
        assert_eq!(state.view.active_detail_index(), None);
    }

    #[test]
    fn open_unknown_id_is_noop() {
        let mut state = loaded_state(&["bulbasaur"], 1302);
        let result = reducer(&mut state, Action::DetailOpen(404));
        assert!(!result.changed);
        assert_eq!(state.screen, Screen::Grid);
    }

    #[test]
    fn next_at_catalog_end_raises_at_end() {
        let mut state = loaded_state(&["bulbasaur", "ivysaur"], 2);
        reducer(&mut state, Action::DetailOpen(2));

        let result = reducer(&mut state, Action::DetailNext);
        assert!(result.effects.is_empty());
        assert_eq!(
            state.notice,
            Some(Notice::Boundary(DetailBoundary::AtEnd))
        );
        assert_eq!(state.view.active_detail_index(), Some(1));
    }

    #[test]
    fn previous_at_start_raises_at_start() {
        let mut state = loaded_state(&["bulbasaur", "ivysaur"], 2);
        reducer(&mut state, Action::DetailOpen(1));
        reducer(&mut state, Action::DetailPrev);
        assert_eq!(
            state.notice,
            Some(Notice::Boundary(DetailBoundary::AtStart))
        );
        assert_eq!(state.view.active_detail_index(), Some(0));
    }

    #[test]
    fn next_past_loaded_records_fetches_and_advances() {
        let mut state = loaded_state(&["bulbasaur", "ivysaur"], 1302);
        reducer(&mut state, Action::DetailOpen(2));

        let result = reducer(&mut state, Action::DetailNext);
        assert_eq!(
            result.effects,
            vec![Effect::FetchPage {
                offset: 2,
                limit: 25
            }]
        );
        assert_eq!(state.screen, Screen::Detail);
        assert!(state.notice.is_none());

        reducer(&mut state, Action::PageDidLoad(page(2, &["venusaur"], 1302)));
        assert_eq!(state.screen, Screen::Detail);
        assert_eq!(state.detail_record().map(|r| r.name.as_str()), Some("venusaur"));
        assert_eq!(state.detail_position(), Some((3, 3)));
    }

    #[test]
    fn next_skips_past_a_fully_dropped_page() {
        let mut state = loaded_state(&["bulbasaur", "ivysaur"], 1302);
        reducer(&mut state, Action::DetailOpen(2));
        reducer(&mut state, Action::DetailNext);

        let result = reducer(
            &mut state,
            Action::PageDidLoad(LoadedPage {
                offset: 2,
                limit: 25,
                requested: 25,
                total: Some(1302),
                records: Vec::new(),
                dropped: 25,
            }),
        );
        assert!(state.notice.is_none());
        assert!(state.fetch_in_flight);
        assert_eq!(
            result.effects,
            vec![Effect::FetchPage {
                offset: 27,
                limit: 25
            }]
        );
        assert_eq!(state.detail_position(), Some((2, 2)));

        reducer(&mut state, Action::PageDidLoad(page(27, &["venusaur"], 1302)));
        assert!(state.notice.is_none());
        assert_eq!(state.detail_record().map(|r| r.name.as_str()), Some("venusaur"));
    }

    #[test]
    fn dropped_page_at_catalog_end_raises_at_end() {
        let mut state = loaded_state(&["bulbasaur", "ivysaur"], 4);
        reducer(&mut state, Action::DetailOpen(2));
        reducer(&mut state, Action::DetailNext);

        let result = reducer(
            &mut state,
            Action::PageDidLoad(LoadedPage {
                offset: 2,
                limit: 25,
                requested: 2,
                total: Some(4),
                records: Vec::new(),
                dropped: 2,
            }),
        );
        assert!(result.effects.is_empty());
        assert!(!state.fetch_in_flight);
        assert_eq!(
            state.notice,
            Some(Notice::Boundary(DetailBoundary::AtEnd))
        );
    }

    #[test]
    fn detail_tabs_only_change_in_detail() {
        let mut state = loaded_state(&["bulbasaur"], 1);
        assert!(!reducer(&mut state, Action::DetailTabNext).changed);

        reducer(&mut state, Action::DetailOpen(1));
        reducer(&mut state, Action::DetailTabNext);
        assert_eq!(state.detail_tab, DetailTab::BaseStats);
        reducer(&mut state, Action::DetailTabSet(DetailTab::Shiny));
        assert_eq!(state.detail_tab, DetailTab::Shiny);
        reducer(&mut state, Action::DetailTabPrev);
        assert_eq!(state.detail_tab, DetailTab::BaseStats);
    }

    #[test]
    fn notice_blocks_navigation_until_dismissed() {
        let mut state = loaded_state(&["bulbasaur", "ivysaur"], 2);
        reducer(&mut state, Action::DetailOpen(1));
        reducer(&mut state, Action::DetailPrev);
        assert!(state.notice.is_some());

        assert!(!reducer(&mut state, Action::DetailNext).changed);
        reducer(&mut state, Action::NoticeDismiss);
        reducer(&mut state, Action::DetailNext);
        assert_eq!(state.view.active_detail_index(), Some(1));
    }

    #[test]
    fn tick_only_animates_while_fetching() {
        let mut state = loaded_state(&["bulbasaur"], 1302);
        assert!(!reducer(&mut state, Action::Tick).changed);

        reducer(&mut state, Action::LoadMore);
        assert!(reducer(&mut state, Action::Tick).changed);
        assert_eq!(state.tick, 1);
    }
}
