use std::collections::HashMap;

/// Case-insensitive name to column index lookup. The first occurrence of a
/// name wins.
#[derive(Debug, Clone, Default)]
pub struct CaseInsensitiveLookup {
    map: HashMap<String, usize>,
}

impl CaseInsensitiveLookup {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut map = HashMap::new();
        for (index, name) in names.into_iter().enumerate() {
            let key = name.as_ref().trim().to_ascii_uppercase();
            map.entry(key).or_insert(index);
        }
        Self { map }
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.map.get(&name.trim().to_ascii_uppercase()).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
