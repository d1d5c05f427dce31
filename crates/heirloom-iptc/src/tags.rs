//! Named IPTC tags and partial updates.

use crate::iim::{
    DataSet, APPLICATION_RECORD, APPLICATION_VERSION, CODED_CHARACTER_SET, ENVELOPE_RECORD,
    ENVELOPE_VERSION, RECORD_VERSION, UTF8_CHARSET,
};

/// Application-record tags this crate knows by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    /// 2:05, short title of the photo.
    ObjectName,
    /// 2:25, repeatable.
    Keywords,
    /// 2:80, photographer.
    ByLine,
    /// 2:105
    Headline,
    /// 2:110
    Credit,
    /// 2:115, who supplied the photo.
    Source,
    /// 2:120, free-text description.
    CaptionAbstract,
}

impl Tag {
    pub const ALL: [Tag; 7] = [
        Tag::ObjectName,
        Tag::Keywords,
        Tag::ByLine,
        Tag::Headline,
        Tag::Credit,
        Tag::Source,
        Tag::CaptionAbstract,
    ];

    /// Dataset number within the application record.
    pub fn dataset(self) -> u8 {
        match self {
            Tag::ObjectName => 5,
            Tag::Keywords => 25,
            Tag::ByLine => 80,
            Tag::Headline => 105,
            Tag::Credit => 110,
            Tag::Source => 115,
            Tag::CaptionAbstract => 120,
        }
    }

    /// Conventional IPTC name, as shown by metadata tools.
    pub fn name(self) -> &'static str {
        match self {
            Tag::ObjectName => "object name",
            Tag::Keywords => "keywords",
            Tag::ByLine => "by-line",
            Tag::Headline => "headline",
            Tag::Credit => "credit",
            Tag::Source => "source",
            Tag::CaptionAbstract => "caption/abstract",
        }
    }

    pub fn from_dataset(number: u8) -> Option<Tag> {
        Tag::ALL.into_iter().find(|tag| tag.dataset() == number)
    }

    fn matches(self, dataset: &DataSet) -> bool {
        dataset.key() == (APPLICATION_RECORD, self.dataset())
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The three tags the archive maintains, each optional.
///
/// `None` leaves a tag as it is in the file. `Some("")` removes it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagUpdate {
    /// Written to object name (2:05).
    pub title: Option<String>,
    /// Written to caption/abstract (2:120).
    pub description: Option<String>,
    /// Written to source (2:115).
    pub source: Option<String>,
}

impl TagUpdate {
    pub fn title(mut self, value: impl Into<String>) -> Self {
        self.title = Some(value.into());
        self
    }

    pub fn description(mut self, value: impl Into<String>) -> Self {
        self.description = Some(value.into());
        self
    }

    pub fn source(mut self, value: impl Into<String>) -> Self {
        self.source = Some(value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.source.is_none()
    }

    fn entries(&self) -> [(Tag, Option<&str>); 3] {
        [
            (Tag::ObjectName, self.title.as_deref()),
            (Tag::CaptionAbstract, self.description.as_deref()),
            (Tag::Source, self.source.as_deref()),
        ]
    }
}

/// Decode a text value. Undeclared non-UTF-8 text is taken as Latin-1.
fn decode_text(value: &[u8], utf8: bool) -> String {
    if utf8 {
        return String::from_utf8_lossy(value).into_owned();
    }
    match std::str::from_utf8(value) {
        Ok(text) => text.to_string(),
        Err(_) => value.iter().map(|&b| b as char).collect(),
    }
}

/// The IIM datasets of one image.
///
/// Datasets this crate does not know by name are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IptcTags {
    datasets: Vec<DataSet>,
    utf8: bool,
}

impl IptcTags {
    pub fn from_datasets(datasets: Vec<DataSet>) -> Self {
        let utf8 = crate::iim::declares_utf8(&datasets);
        Self { datasets, utf8 }
    }

    pub fn datasets(&self) -> &[DataSet] {
        &self.datasets
    }

    /// First value of a tag.
    pub fn get(&self, tag: Tag) -> Option<String> {
        self.datasets
            .iter()
            .find(|d| tag.matches(d))
            .map(|d| decode_text(&d.value, self.utf8))
    }

    /// All values of a tag, in file order.
    pub fn get_all(&self, tag: Tag) -> Vec<String> {
        self.datasets
            .iter()
            .filter(|d| tag.matches(d))
            .map(|d| decode_text(&d.value, self.utf8))
            .collect()
    }

    /// Named tags with their values, in file order.
    pub fn iter(&self) -> impl Iterator<Item = (Tag, String)> + '_ {
        self.datasets.iter().filter_map(move |d| {
            if d.record != APPLICATION_RECORD {
                return None;
            }
            Tag::from_dataset(d.number).map(|tag| (tag, decode_text(&d.value, self.utf8)))
        })
    }

    /// True when no application data besides the record version is present.
    pub fn is_empty(&self) -> bool {
        !self
            .datasets
            .iter()
            .any(|d| d.record == APPLICATION_RECORD && d.number != APPLICATION_VERSION)
    }

    /// Replace every value of `tag` with a single one.
    pub fn set(&mut self, tag: Tag, value: &str) {
        self.promote_to_utf8();
        match self.datasets.iter().position(|d| tag.matches(d)) {
            Some(index) => {
                self.datasets[index].value = value.as_bytes().to_vec();
                let mut seen = 0usize;
                self.datasets.retain(|d| {
                    if tag.matches(d) {
                        seen += 1;
                        seen == 1
                    } else {
                        true
                    }
                });
            }
            None => self
                .datasets
                .push(DataSet::new(APPLICATION_RECORD, tag.dataset(), value)),
        }
    }

    pub fn remove(&mut self, tag: Tag) {
        self.datasets.retain(|d| !tag.matches(d));
    }

    /// Apply a partial update.
    pub fn apply(&mut self, update: &TagUpdate) {
        for (tag, value) in update.entries() {
            match value {
                Some("") => self.remove(tag),
                Some(value) => self.set(tag, value),
                None => {}
            }
        }
    }

    /// Datasets ready to be written, or an empty list when there is nothing
    /// worth storing.
    ///
    /// Adds record versions and the UTF-8 declaration, then orders datasets
    /// by record and number. Repeated datasets keep their relative order.
    pub fn to_datasets(&self) -> Vec<DataSet> {
        if self.is_empty() {
            return Vec::new();
        }

        let mut out = self.datasets.clone();
        if self.utf8 {
            out.retain(|d| d.key() != (ENVELOPE_RECORD, CODED_CHARACTER_SET));
            out.push(DataSet::new(ENVELOPE_RECORD, CODED_CHARACTER_SET, UTF8_CHARSET));
        }
        for key in [
            (ENVELOPE_RECORD, ENVELOPE_VERSION),
            (APPLICATION_RECORD, APPLICATION_VERSION),
        ] {
            if !out.iter().any(|d| d.key() == key) {
                out.push(DataSet::new(key.0, key.1, RECORD_VERSION));
            }
        }
        out.sort_by_key(DataSet::key);
        out
    }

    /// Re-encode existing application text as UTF-8 before mixing in new
    /// values, so the whole record can be declared UTF-8.
    fn promote_to_utf8(&mut self) {
        if self.utf8 {
            return;
        }
        for dataset in &mut self.datasets {
            if dataset.record == APPLICATION_RECORD && dataset.number != APPLICATION_VERSION {
                dataset.value = decode_text(&dataset.value, false).into_bytes();
            }
        }
        self.utf8 = true;
    }
}
