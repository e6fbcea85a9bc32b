use std::fmt;

/// Product fields a vendor page can yield.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Brand,
    ItemNumber,
    ProductTitle,
    Price,
    ImageUrl,
    PageTitle,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Brand,
        Field::ItemNumber,
        Field::ProductTitle,
        Field::Price,
        Field::ImageUrl,
        Field::PageTitle,
    ];

    /// Metadata key used unless a vendor overrides it.
    pub fn default_key(self) -> &'static str {
        match self {
            Field::Brand => "brand",
            Field::ItemNumber => "itemNumber",
            Field::ProductTitle => "productTitle",
            Field::Price => "price",
            Field::ImageUrl => "imgURL",
            Field::PageTitle => "pageTitle",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_key())
    }
}

/// Field values found on one page. A field, once set, keeps its value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFields {
    values: [Option<String>; 6],
}

impl ExtractedFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` if `field` is still unset. Returns whether it was stored.
    pub fn set(&mut self, field: Field, value: impl Into<String>) -> bool {
        let slot = &mut self.values[field.slot()];
        if slot.is_some() {
            return false;
        }
        *slot = Some(value.into());
        true
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.values[field.slot()].as_deref()
    }

    pub fn is_set(&self, field: Field) -> bool {
        self.values[field.slot()].is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    /// Fills every field still unset here from `other`.
    pub fn merge(&mut self, other: &ExtractedFields) {
        for (field, value) in other.iter() {
            self.set(field, value);
        }
    }

    /// Present fields in [`Field::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        Field::ALL
            .into_iter()
            .filter_map(move |field| self.get(field).map(|value| (field, value)))
    }
}
