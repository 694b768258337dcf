use serde::{Deserialize, Serialize};

/// Ordered, de-duplicated set of application display names allowed to stay
/// visible. An empty list allows everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowList {
    apps: Vec<String>,
}

impl AllowList {
    pub fn new<I, S>(apps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Self::default();
        for app in apps {
            let app = app.into().trim().to_string();
            if app.is_empty() || list.apps.contains(&app) {
                continue;
            }
            list.apps.push(app);
        }
        list
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.apps.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_and_duplicate_entries_are_dropped() {
        let list = AllowList::new(["Firefox", "  ", "Slack", "Firefox", " Slack "]);
        assert_eq!(list.iter().collect::<Vec<_>>(), vec!["Firefox", "Slack"]);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_empty_list() {
        let list = AllowList::new(Vec::<String>::new());
        assert!(list.is_empty());
    }
}
