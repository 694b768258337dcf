use crate::mappings::{ProcessAliasMap, SystemDenylist, ENGINE_NAME};
use crate::model::{AllowList, WindowRecord};

/// Decides whether a window may stay visible during a session.
///
/// All comparisons are case-insensitive substring checks. The first matching
/// rule wins:
/// 1. empty allow-list
/// 2. the engine's own name
/// 3. the platform system denylist
/// 4. an allow-listed display name
/// 5. an alias of an allow-listed display name
pub struct AllowListMatcher {
    denylist: SystemDenylist,
    aliases: ProcessAliasMap,
}

impl AllowListMatcher {
    pub fn new(denylist: SystemDenylist, aliases: ProcessAliasMap) -> Self {
        Self { denylist, aliases }
    }

    /// A window is allowed if either its title or its process label passes.
    pub fn is_allowed(&self, window_label: &str, process_label: Option<&str>, allow_list: &AllowList) -> bool {
        if allow_list.is_empty() {
            return true;
        }

        if self.label_allowed(window_label, allow_list) {
            return true;
        }

        match process_label {
            Some(label) if !label.trim().is_empty() => self.label_allowed(label, allow_list),
            _ => false,
        }
    }

    pub fn is_window_allowed(&self, window: &WindowRecord, allow_list: &AllowList) -> bool {
        self.is_allowed(&window.title, window.process_label(), allow_list)
    }

    fn label_allowed(&self, label: &str, allow_list: &AllowList) -> bool {
        let label = label.to_lowercase();

        if label.contains(ENGINE_NAME) {
            return true;
        }

        if self.denylist.matches(&label) {
            return true;
        }

        allow_list.iter().any(|app| {
            label.contains(&app.to_lowercase())
                || self
                    .aliases_of(app)
                    .iter()
                    .any(|alias| label.contains(alias.as_str()))
        })
    }

    fn aliases_of(&self, app: &str) -> &[String] {
        self.aliases.aliases_for(app)
    }
}
