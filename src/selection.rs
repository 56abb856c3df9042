use crate::filters::TranslationFilters;
use crate::models::TranslationId;

/// Header checkbox state for the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderState {
    Unchecked,
    Indeterminate,
    Checked,
}

#[derive(Debug, Default, Clone)]
pub struct SelectionSet {
    // Insertion order is kept so bulk requests list ids the way they were picked.
    ids: Vec<TranslationId>,
    scope: TranslationFilters,
}

impl SelectionSet {
    pub fn select_row(&mut self, id: TranslationId, checked: bool) {
        let present = self.ids.contains(&id);
        if checked && !present {
            self.ids.push(id);
        } else if !checked && present {
            self.ids.retain(|selected| *selected != id);
        }
    }

    /// Header checkbox: replace the selection with every visible row, or clear it.
    pub fn select_all(&mut self, checked: bool, visible: &[TranslationId]) {
        self.ids.clear();
        if checked {
            for id in visible {
                if !self.ids.contains(id) {
                    self.ids.push(*id);
                }
            }
        }
    }

    pub fn header_state(&self, visible: &[TranslationId]) -> HeaderState {
        let selected = visible.iter().filter(|id| self.ids.contains(id)).count();
        match selected {
            0 => HeaderState::Unchecked,
            n if n == visible.len() => HeaderState::Checked,
            _ => HeaderState::Indeterminate,
        }
    }

    /// Returns true if the selection was emptied.
    pub fn on_filters_changed(&mut self, filters: &TranslationFilters) -> bool {
        if *filters == self.scope {
            return false;
        }
        self.scope = filters.clone();
        let had_rows = !self.ids.is_empty();
        self.ids.clear();
        had_rows
    }

    pub fn contains(&self, id: TranslationId) -> bool {
        self.ids.contains(&id)
    }

    pub fn ids(&self) -> Vec<TranslationId> {
        self.ids.clone()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}
