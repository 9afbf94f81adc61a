use serde::{Deserialize, Serialize};

/// A library tied in a report, with its own signature-multiset size
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TiedLibrary {
    pub name: String,
    pub size: usize,
}

/// One attribution: a block of matched units and every library that explains
/// it equally well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Number of target units explained (counting multiplicity)
    matched_units: usize,

    /// Libraries with identical matched content, in ranking order
    libraries: Vec<TiedLibrary>,

    /// Original unit names covered by the match
    matched_names: Vec<String>,
}

impl Report {
    #[must_use]
    pub fn new(matched_units: usize, libraries: Vec<TiedLibrary>, matched_names: Vec<String>) -> Self {
        Self {
            matched_units,
            libraries,
            matched_names,
        }
    }

    #[must_use]
    pub fn matched_units(&self) -> usize {
        self.matched_units
    }

    #[must_use]
    pub fn libraries(&self) -> &[TiedLibrary] {
        &self.libraries
    }

    /// Names of the tied libraries
    #[must_use]
    pub fn library_names(&self) -> Vec<&str> {
        self.libraries.iter().map(|l| l.name.as_str()).collect()
    }

    #[must_use]
    pub fn matched_names(&self) -> &[String] {
        &self.matched_names
    }

    /// `count,tied,lib1[size];lib2[size],name1;name2`, sizes optional
    #[must_use]
    pub fn to_row(&self, with_sizes: bool) -> String {
        let libraries: Vec<String> = self
            .libraries
            .iter()
            .map(|l| {
                if with_sizes {
                    format!("{}[{}]", l.name, l.size)
                } else {
                    l.name.clone()
                }
            })
            .collect();
        format!(
            "{},{},{},{}",
            self.matched_units,
            self.libraries.len(),
            libraries.join(";"),
            self.matched_names.join(";")
        )
    }
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_row(true))
    }
}
