//! Query path convention
//!
//! Store queries use `/<queryType>/<storeName>/<subpath>`. Only `key` and
//! `store` subpaths carry a proof; everything else (e.g. `subspace`) is
//! returned unverified.

/// Whether the substore attaches a proof for `subpath`
pub fn require_proof(subpath: &str) -> bool {
    subpath == "/key"
}

/// Whether a response to `path` must be verified
pub fn is_query_store_with_proof(path: &str) -> bool {
    let Some(rest) = path.strip_prefix('/') else {
        return false;
    };
    let parts: Vec<&str> = rest.splitn(3, '/').collect();
    match parts.as_slice() {
        [_, _, subpath] => *subpath == "store" || *subpath == "key",
        _ => false,
    }
}

/// Store name component of a `/<queryType>/<storeName>/<subpath>` path
pub fn store_name(path: &str) -> Option<&str> {
    let rest = path.strip_prefix('/')?;
    let mut parts = rest.splitn(3, '/');
    let _query_type = parts.next()?;
    let name = parts.next()?;
    parts.next()?;
    Some(name)
}

/// Path for a store query
pub fn store_query_path(store: &str, end_path: &str) -> String {
    format!("/store/{}/{}", store, end_path)
}
