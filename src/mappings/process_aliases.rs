use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Maps an application's display name to the process names and window classes
/// it shows up under.
pub struct ProcessAliasMap {
    aliases: HashMap<String, Vec<String>>,
}

// Keys are stored lowercased; lookups go through `ProcessAliasMap::aliases_for`.
static BUILTIN_ALIASES: Lazy<HashMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    let mut map: HashMap<&'static str, &'static [&'static str]> = HashMap::new();

    // Editors and IDEs
    map.insert("visual studio code", &["code", "code-oss", "codium"]);
    map.insert("vs code oss", &["code-oss", "code - oss"]);
    map.insert("sublime text", &["sublime_text", "subl", "sublime"]);
    map.insert("intellij idea", &["idea", "intellij", "jetbrains-idea"]);
    map.insert("webstorm", &["webstorm", "jetbrains-webstorm"]);
    map.insert("pycharm", &["pycharm", "jetbrains-pycharm"]);
    map.insert("android studio", &["studio", "android-studio"]);

    // Browsers
    map.insert("firefox", &["firefox", "firefox-esr"]);
    map.insert("google chrome", &["chrome", "google-chrome"]);
    map.insert("chromium", &["chromium", "chromium-browser"]);

    // Terminals
    map.insert("terminal gnome", &["gnome-terminal", "gnome-terminal-server"]);
    map.insert("konsole", &["konsole"]);
    map.insert("alacritty", &["alacritty"]);
    map.insert("kitty", &["kitty"]);

    // Communication
    map.insert("slack", &["slack"]);
    map.insert("discord", &["discord"]);
    map.insert("telegram", &["telegram", "telegram-desktop"]);
    map.insert("whatsapp", &["whatsapp"]);
    map.insert("thunderbird", &["thunderbird"]);
    map.insert("zoom", &["zoom"]);
    map.insert("microsoft teams", &["teams"]);

    // Productivity and tooling
    map.insert("notion", &["notion"]);
    map.insert("obsidian", &["obsidian"]);
    map.insert("postman", &["postman"]);
    map.insert("insomnia", &["insomnia"]);
    map.insert("dbeaver", &["dbeaver"]);
    map.insert("gitkraken", &["gitkraken"]);
    map.insert("libreoffice writer", &["soffice", "libreoffice"]);
    map.insert("libreoffice calc", &["soffice", "libreoffice"]);

    // Media and design
    map.insert("spotify", &["spotify"]);
    map.insert("figma", &["figma"]);
    map.insert("gimp", &["gimp"]);
    map.insert("inkscape", &["inkscape"]);
    map.insert("blender", &["blender"]);
    map.insert("vlc", &["vlc"]);
    map.insert("steam", &["steam"]);

    // File managers
    map.insert("files", &["nautilus", "files"]);
    map.insert("arquivos", &["nautilus", "files"]);
    map.insert("dolphin", &["dolphin"]);

    map
});

impl ProcessAliasMap {
    /// Built-in table only.
    pub fn builtin() -> Self {
        Self::with_extra(&HashMap::new())
    }

    /// Built-in table with user-configured aliases appended.
    pub fn with_extra(extra: &HashMap<String, Vec<String>>) -> Self {
        let mut aliases: HashMap<String, Vec<String>> = BUILTIN_ALIASES
            .iter()
            .map(|(app, names)| (app.to_string(), names.iter().map(|n| n.to_string()).collect()))
            .collect();

        for (app, names) in extra {
            let entry = aliases.entry(app.to_lowercase()).or_default();
            for name in names {
                let name = name.to_lowercase();
                if !entry.contains(&name) {
                    entry.push(name);
                }
            }
        }

        Self { aliases }
    }

    /// Lowercased aliases for a display name; empty when the app is unknown.
    pub fn aliases_for(&self, display_name: &str) -> &[String] {
        self.aliases
            .get(&display_name.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn display_names(&self) -> impl Iterator<Item = &str> {
        self.aliases.keys().map(String::as_str)
    }
}

impl Default for ProcessAliasMap {
    fn default() -> Self {
        Self::builtin()
    }
}
