//! Pure helpers shared by the renderer and its callers.

/// File stem used when a title slugs down to nothing.
pub const DEFAULT_SLUG: &str = "figure";

/// Derives a filesystem-safe, lowercase file stem from a chart title.
///
/// Every run of characters outside `[A-Za-z0-9]` becomes a single `_`,
/// leading and trailing underscores are dropped, and an empty result maps
/// to [`DEFAULT_SLUG`]. The function is idempotent.
///
/// ```rust
/// use folio_common::slugify;
///
/// assert_eq!(slugify("Revenue Growth (%)"), "revenue_growth");
/// assert_eq!(slugify("@@@"), "figure");
/// ```
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_separator = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('_');
            }
            pending_separator = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }

    if slug.is_empty() {
        DEFAULT_SLUG.to_string()
    } else {
        slug
    }
}

/// Computes the `(rows, cols)` grid needed to hold `n` panels in `cols` columns.
///
/// The last row may be partially filled. `cols` of zero is treated as one.
pub fn layout(n: usize, cols: usize) -> (usize, usize) {
    let cols = cols.max(1);
    (n.div_ceil(cols), cols)
}
