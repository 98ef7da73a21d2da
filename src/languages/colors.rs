// Deterministic language colors
// Author: kelexine (https://github.com/kelexine)

use phf::phf_map;
use sha2::{Digest, Sha256};

/// Linguist colors for common languages.
static LANGUAGE_COLORS: phf::Map<&'static str, &'static str> = phf_map! {
    "Assembly" => "#6E4C13",
    "C" => "#555555",
    "C#" => "#178600",
    "C++" => "#f34b7d",
    "Clojure" => "#db5855",
    "CoffeeScript" => "#244776",
    "CSS" => "#563d7c",
    "Dart" => "#00B4AB",
    "Dockerfile" => "#384d54",
    "Elixir" => "#6e4a7e",
    "Elm" => "#60B5CC",
    "Erlang" => "#B83998",
    "F#" => "#b845fc",
    "Go" => "#00ADD8",
    "Groovy" => "#4298b8",
    "Haskell" => "#5e5086",
    "HCL" => "#844FBA",
    "HTML" => "#e34c26",
    "Java" => "#b07219",
    "JavaScript" => "#f1e05a",
    "Jupyter Notebook" => "#DA5B0B",
    "Kotlin" => "#A97BFF",
    "Lua" => "#000080",
    "Makefile" => "#427819",
    "Nix" => "#7e7eff",
    "Objective-C" => "#438eff",
    "OCaml" => "#ef7a08",
    "Perl" => "#0298c3",
    "PHP" => "#4F5D95",
    "PowerShell" => "#012456",
    "Python" => "#3572A5",
    "R" => "#198CE7",
    "Ruby" => "#701516",
    "Rust" => "#dea584",
    "Scala" => "#c22d40",
    "SCSS" => "#c6538c",
    "Shell" => "#89e051",
    "Solidity" => "#AA6746",
    "Svelte" => "#ff3e00",
    "Swift" => "#F05138",
    "TeX" => "#3D6117",
    "TypeScript" => "#3178c6",
    "Vim Script" => "#199f4b",
    "Vue" => "#41b883",
    "Zig" => "#ec915c",
};

/// Color for a language name.
///
/// Known names map through the linguist palette (exact match first, then a
/// case-insensitive scan); unknown names get an HSL color whose hue comes from
/// a SHA-256 digest of the name, so the same name always yields the same color.
pub fn language_color(name: &str) -> String {
    if let Some(color) = LANGUAGE_COLORS.get(name) {
        return (*color).to_string();
    }

    if let Some((_, color)) = LANGUAGE_COLORS
        .entries()
        .find(|(known, _)| known.eq_ignore_ascii_case(name))
    {
        return (*color).to_string();
    }

    let digest = Sha256::digest(name.as_bytes());
    let hue = u16::from_be_bytes([digest[0], digest[1]]) % 360;
    format!("hsl({}, 65%, 55%)", hue)
}
