use ahash::AHashMap;

/// Compact id assigned to a cookie name. The first name seen gets 1.
pub type CookieId = u64;

// Interner: assigns a compact id to each unique cookie name.
// Names live in a Vec indexed by `id - 1` with a map for the reverse lookup,
// so each name is allocated once no matter how often it repeats.
#[derive(Debug, Default)]
pub struct Interner {
    name_by_id: Vec<String>,
    id_by_name: AHashMap<String, CookieId>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id of `name`, allocating the next one on first sight.
    pub fn intern(&mut self, name: &str) -> CookieId {
        // Fast path: look up without allocating
        if let Some(&id) = self.id_by_name.get(name) {
            return id;
        }

        self.name_by_id.push(name.to_owned());
        let id = self.name_by_id.len() as CookieId;
        self.id_by_name.insert(name.to_owned(), id);
        id
    }

    /// Id previously assigned to `name`, if any.
    pub fn get(&self, name: &str) -> Option<CookieId> {
        self.id_by_name.get(name).copied()
    }

    pub fn resolve(&self, id: CookieId) -> Option<&str> {
        let index = usize::try_from(id).ok()?.checked_sub(1)?;
        self.name_by_id.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.name_by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.name_by_id.is_empty()
    }
}

/// Occurrence counts keyed by normalized date, then by interned cookie id.
///
/// The table has no internal synchronization. During a scan it is owned by the
/// single aggregator thread and every other access happens after that thread
/// has been joined.
#[derive(Debug, Default)]
pub struct FrequencyTable {
    interner: Interner,
    by_date: AHashMap<String, AHashMap<CookieId, u64>>,
    total: u64,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, name: &str) -> CookieId {
        self.interner.intern(name)
    }

    /// Counts one occurrence of `name` on `date`.
    pub fn record(&mut self, date: &str, name: &str) {
        let id = self.interner.intern(name);
        if let Some(counts) = self.by_date.get_mut(date) {
            *counts.entry(id).or_insert(0) += 1;
        } else {
            self.by_date.entry(date.to_owned()).or_default().insert(id, 1);
        }
        self.total += 1;
    }

    /// Name-keyed view of the counts recorded on `date`.
    ///
    /// Empty when nothing was recorded on that date.
    pub fn query(&self, date: &str) -> AHashMap<&str, u64> {
        let Some(counts) = self.by_date.get(date) else {
            return AHashMap::new();
        };
        counts
            .iter()
            .filter_map(|(&id, &count)| self.interner.resolve(id).map(|name| (name, count)))
            .collect()
    }

    pub fn count(&self, date: &str, name: &str) -> u64 {
        self.interner
            .get(name)
            .and_then(|id| self.by_date.get(date)?.get(&id).copied())
            .unwrap_or(0)
    }

    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    pub fn dates(&self) -> impl Iterator<Item = &str> {
        self.by_date.keys().map(String::as_str)
    }

    pub fn distinct_identifiers(&self) -> usize {
        self.interner.len()
    }

    /// Number of records counted since the table was created or cleared.
    pub fn total_records(&self) -> u64 {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Drops every count and restarts id assignment at 1.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
