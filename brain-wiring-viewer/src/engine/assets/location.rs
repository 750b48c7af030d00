use constants::path::{CACHE_BUST_PARAM, MANIFEST_FILE};

/// Pack root for a tag, e.g. `packs/{tag}` -> `packs/v0.1`.
pub fn pack_root(template: &str, tag: &str) -> String {
    template.replace("{tag}", tag).trim_end_matches('/').to_string()
}

/// True for scheme-prefixed URLs such as `https://...` or `data:...`.
pub fn has_scheme(url: &str) -> bool {
    let Some(colon) = url.find(':') else {
        return false;
    };
    let scheme = &url[..colon];
    // Single letters are Windows drive prefixes, not schemes.
    scheme.len() > 1
        && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Resolve a manifest path against the pack root. Absolute URLs pass through.
pub fn resolve_asset_url(pack_root: &str, path: &str) -> String {
    if has_scheme(path) || path.starts_with('/') {
        return path.to_string();
    }
    let relative = path.trim_start_matches("./");
    if pack_root.is_empty() {
        relative.to_string()
    } else {
        format!("{}/{}", pack_root.trim_end_matches('/'), relative)
    }
}

/// Asset-server path of a mesh. Scheme-prefixed URLs are kept verbatim, so
/// `https://host/a.glb` loads through the `https` asset source and its
/// buffers resolve against the same base. No cache buster is ever added.
pub fn mesh_asset_path(pack_root: &str, path: &str) -> String {
    let url = resolve_asset_url(pack_root, path);
    if has_scheme(&url) {
        url
    } else {
        url.trim_start_matches('/').to_string()
    }
}

pub fn manifest_path(pack_root: &str) -> String {
    resolve_asset_url(pack_root, MANIFEST_FILE)
}

/// Append a varying query parameter so stale cached JSON is bypassed.
/// Only for manifest and payload JSON; mesh URLs must stay stable.
pub fn with_cache_buster(url: &str, nonce: u64) -> String {
    let (base, fragment) = match url.find('#') {
        Some(idx) => (&url[..idx], &url[idx..]),
        None => (url, ""),
    };
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{base}{separator}{CACHE_BUST_PARAM}={nonce}{fragment}")
}

/// Request path without query or fragment, used for filesystem reads.
pub fn strip_query(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_root_substitutes_tag() {
        assert_eq!(pack_root("packs/{tag}/", "v0.1"), "packs/v0.1");
    }

    #[test]
    fn relative_paths_join_pack_root() {
        assert_eq!(
            resolve_asset_url("packs/v0.1", "./bundles/af.json"),
            "packs/v0.1/bundles/af.json"
        );
    }

    #[test]
    fn absolute_urls_are_verbatim() {
        let url = "https://cdn.example.org/packs/brain.glb";
        assert_eq!(resolve_asset_url("packs/v0.1", url), url);
        assert_eq!(resolve_asset_url("packs/v0.1", "/shared/a.json"), "/shared/a.json");
    }

    #[test]
    fn mesh_paths_keep_absolute_urls_untouched() {
        let url = "https://cdn.example.org/meshes/af.glb";
        assert_eq!(mesh_asset_path("packs/v0.1", url), url);
        assert_eq!(mesh_asset_path("packs/v0.1", "meshes/af.glb"), "packs/v0.1/meshes/af.glb");
        assert_eq!(mesh_asset_path("packs/v0.1", "/shared/brain.glb"), "shared/brain.glb");
    }

    #[test]
    fn drive_letters_are_not_schemes() {
        assert!(!has_scheme("c:/data/brain.glb"));
        assert!(has_scheme("data:application/json,{}"));
        assert!(!has_scheme("bundles/af.json"));
    }

    #[test]
    fn cache_buster_respects_existing_query_and_fragment() {
        assert_eq!(with_cache_buster("a/manifest.json", 7), "a/manifest.json?v=7");
        assert_eq!(with_cache_buster("a/m.json?x=1", 7), "a/m.json?x=1&v=7");
        assert_eq!(with_cache_buster("a/m.json#top", 7), "a/m.json?v=7#top");
    }

    #[test]
    fn strip_query_removes_cache_buster() {
        assert_eq!(strip_query("packs/v0.1/manifest.json?v=12"), "packs/v0.1/manifest.json");
        assert_eq!(strip_query("plain.json"), "plain.json");
    }
}
