//! Anchored text edits
//!
//! An edit finds a literal anchor in a file and inserts text next to it (or
//! replaces it), leaving the rest of the file byte-for-byte intact.

/// Where the generated text goes relative to the anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Before,
    After,
    /// The anchor itself is replaced
    Replace,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchoredEdit {
    pub anchor: String,
    pub placement: Placement,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Applied(String),
    /// The text is already in place; nothing to do
    AlreadyApplied,
    AnchorNotFound,
}

impl AnchoredEdit {
    pub fn insert_after(anchor: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(anchor, Placement::After, text)
    }

    pub fn insert_before(anchor: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(anchor, Placement::Before, text)
    }

    pub fn replace(anchor: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(anchor, Placement::Replace, text)
    }

    fn new(anchor: impl Into<String>, placement: Placement, text: impl Into<String>) -> Self {
        Self {
            anchor: anchor.into(),
            placement,
            text: text.into(),
        }
    }

    /// Apply the edit at the first occurrence of the anchor
    ///
    /// Re-applying an edit never duplicates its text. See
    /// [`apply_alongside`](Self::apply_alongside) when other edits share the
    /// same anchor and placement.
    pub fn apply(&self, content: &str) -> EditOutcome {
        self.apply_alongside(content, &[])
    }

    /// Apply the edit, treating `neighbours` as texts that other edits may
    /// already have inserted at the same anchor
    ///
    /// Insertions skip over any neighbour texts sitting next to the anchor
    /// before checking for their own. A replacement counts as applied when
    /// its text is already in place around the anchor, or when the anchor is
    /// gone and the text is present.
    pub fn apply_alongside(&self, content: &str, neighbours: &[&str]) -> EditOutcome {
        let Some(start) = content.find(&self.anchor) else {
            if self.placement == Placement::Replace
                && !self.text.is_empty()
                && content.contains(&self.text)
            {
                return EditOutcome::AlreadyApplied;
            }
            return EditOutcome::AnchorNotFound;
        };
        let end = start + self.anchor.len();

        let mut out = String::with_capacity(content.len() + self.text.len());
        match self.placement {
            Placement::After => {
                if inserted_after(&content[end..], &self.text, neighbours) {
                    return EditOutcome::AlreadyApplied;
                }
                out.push_str(&content[..end]);
                out.push_str(&self.text);
                out.push_str(&content[end..]);
            }
            Placement::Before => {
                if inserted_before(&content[..start], &self.text, neighbours) {
                    return EditOutcome::AlreadyApplied;
                }
                out.push_str(&content[..start]);
                out.push_str(&self.text);
                out.push_str(&content[start..]);
            }
            Placement::Replace => {
                if self.replacement_in_place(content, start) {
                    return EditOutcome::AlreadyApplied;
                }
                out.push_str(&content[..start]);
                out.push_str(&self.text);
                out.push_str(&content[end..]);
            }
        }
        EditOutcome::Applied(out)
    }

    /// The replacement contains the anchor and already surrounds the match at `start`
    fn replacement_in_place(&self, content: &str, start: usize) -> bool {
        let Some(offset) = self.text.find(&self.anchor) else {
            return false;
        };
        start >= offset
            && content
                .get(start - offset..)
                .is_some_and(|rest| rest.starts_with(&self.text))
    }
}

/// Walk forward over texts inserted after the anchor, looking for `text`
fn inserted_after(mut rest: &str, text: &str, neighbours: &[&str]) -> bool {
    loop {
        if rest.starts_with(text) {
            return true;
        }
        match neighbours
            .iter()
            .find(|n| !n.is_empty() && **n != text && rest.starts_with(**n))
        {
            Some(n) => rest = &rest[n.len()..],
            None => return false,
        }
    }
}

/// Walk backward over texts inserted before the anchor, looking for `text`
fn inserted_before(mut rest: &str, text: &str, neighbours: &[&str]) -> bool {
    loop {
        if rest.ends_with(text) {
            return true;
        }
        match neighbours
            .iter()
            .find(|n| !n.is_empty() && **n != text && rest.ends_with(**n))
        {
            Some(n) => rest = &rest[..rest.len() - n.len()],
            None => return false,
        }
    }
}
