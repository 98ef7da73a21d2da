// Card color themes
// Author: kelexine (https://github.com/kelexine)

use phf::phf_map;

/// Colors used by every chart element except the language segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub name: &'static str,
    pub background: &'static str,
    pub border: &'static str,
    pub title: &'static str,
    pub text: &'static str,
    pub muted: &'static str,
    /// Unfilled part of bar tracks.
    pub track: &'static str,
    /// Percentage labels drawn on top of segments.
    pub label: &'static str,
}

pub static DEFAULT_THEME: Theme = Theme {
    name: "default",
    background: "#fffefe",
    border: "#e4e2e2",
    title: "#2f80ed",
    text: "#434d58",
    muted: "#6a737d",
    track: "#eaeef2",
    label: "#ffffff",
};

static THEMES: phf::Map<&'static str, Theme> = phf_map! {
    "default" => Theme {
        name: "default",
        background: "#fffefe",
        border: "#e4e2e2",
        title: "#2f80ed",
        text: "#434d58",
        muted: "#6a737d",
        track: "#eaeef2",
        label: "#ffffff",
    },
    "dark" => Theme {
        name: "dark",
        background: "#151515",
        border: "#2c2c2c",
        title: "#ffffff",
        text: "#9f9f9f",
        muted: "#7a7a7a",
        track: "#2b2b2b",
        label: "#ffffff",
    },
    "radical" => Theme {
        name: "radical",
        background: "#141321",
        border: "#e4e2e2",
        title: "#fe428e",
        text: "#a9fef7",
        muted: "#f8d847",
        track: "#2a2740",
        label: "#141321",
    },
    "tokyonight" => Theme {
        name: "tokyonight",
        background: "#1a1b27",
        border: "#2a2e42",
        title: "#70a5fd",
        text: "#38bdae",
        muted: "#bf91f3",
        track: "#24283b",
        label: "#1a1b27",
    },
    "dracula" => Theme {
        name: "dracula",
        background: "#282a36",
        border: "#44475a",
        title: "#ff6e96",
        text: "#f8f8f2",
        muted: "#79dafa",
        track: "#44475a",
        label: "#282a36",
    },
    "gruvbox" => Theme {
        name: "gruvbox",
        background: "#282828",
        border: "#504945",
        title: "#fabd2f",
        text: "#8ec07c",
        muted: "#fe8019",
        track: "#3c3836",
        label: "#282828",
    },
    "nord" => Theme {
        name: "nord",
        background: "#2e3440",
        border: "#3b4252",
        title: "#81a1c1",
        text: "#d8dee9",
        muted: "#88c0d0",
        track: "#3b4252",
        label: "#2e3440",
    },
    "github_dark" => Theme {
        name: "github_dark",
        background: "#0d1117",
        border: "#30363d",
        title: "#58a6ff",
        text: "#c9d1d9",
        muted: "#8b949e",
        track: "#21262d",
        label: "#0d1117",
    },
};

/// Look up a theme by name (case-insensitive, `-` and `_` interchangeable);
/// unknown names get the default theme.
pub fn find_theme(name: &str) -> &'static Theme {
    let normalized = name.trim().to_ascii_lowercase().replace('-', "_");
    THEMES.get(normalized.as_str()).unwrap_or(&DEFAULT_THEME)
}

/// Names of all available themes, sorted.
pub fn theme_names() -> Vec<&'static str> {
    let mut names: Vec<_> = THEMES.keys().copied().collect();
    names.sort_unstable();
    names
}
