//! Page routes, resolved relative to the current page
//!
//! Links never start with `/`, so the game works both at the site root and
//! under a nested deployment path.

/// Top-level pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Landing / name entry
    Home,
    /// Gameplay
    Game,
    /// Rating table
    Rating,
}

impl Route {
    pub fn file_name(&self) -> &'static str {
        match self {
            Route::Home => "index.html",
            Route::Game => "game.html",
            Route::Rating => "rating.html",
        }
    }

    /// Identify a page from the `data-page` attribute on `<body>`
    pub fn from_page_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "home" | "index" => Some(Route::Home),
            "game" => Some(Route::Game),
            "rating" => Some(Route::Rating),
            _ => None,
        }
    }

    /// Full path for this route given the current page path
    pub fn resolve(&self, current_path: &str) -> String {
        format!("{}{}", base_path(current_path), self.file_name())
    }
}

/// Directory part of a page path, always ending in `/`
///
/// `/games/rally/game.html` -> `/games/rally/`, `/` -> `/`, `` -> `/`
pub fn base_path(current_path: &str) -> &str {
    match current_path.rfind('/') {
        Some(idx) => &current_path[..=idx],
        None => "/",
    }
}

/// Landing-page section for a location hash (`#/rules` -> `rules`)
///
/// Empty, `#` and `#/` all map to `home`.
pub fn section_for_hash(hash: &str) -> &str {
    let trimmed = hash.trim_start_matches('#').trim_start_matches('/');
    if trimmed.is_empty() { "home" } else { trimmed }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_path() {
        assert_eq!(base_path("/games/rally/game.html"), "/games/rally/");
        assert_eq!(base_path("/index.html"), "/");
        assert_eq!(base_path("/nested/"), "/nested/");
        assert_eq!(base_path(""), "/");
    }

    #[test]
    fn test_resolve_nested() {
        assert_eq!(
            Route::Rating.resolve("/games/rally/game.html"),
            "/games/rally/rating.html"
        );
        assert_eq!(Route::Home.resolve("/game.html"), "/index.html");
    }

    #[test]
    fn test_section_for_hash() {
        assert_eq!(section_for_hash(""), "home");
        assert_eq!(section_for_hash("#"), "home");
        assert_eq!(section_for_hash("#/"), "home");
        assert_eq!(section_for_hash("#/rules"), "rules");
    }

    #[test]
    fn test_page_names() {
        assert_eq!(Route::from_page_name("Game"), Some(Route::Game));
        assert_eq!(Route::from_page_name("index"), Some(Route::Home));
        assert_eq!(Route::from_page_name("about"), None);
    }
}
