//! Common utility functions shared across the codebase.

use std::path::Path;

/// Turn an absolute path into a workspace-relative UTF-8 string.
///
/// Returns `None` for paths outside the workspace or with non-UTF-8
/// components; callers skip those files.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use keysync::utils::to_workspace_relative;
///
/// let root = Path::new("/work");
/// assert_eq!(
///     to_workspace_relative(Path::new("/work/src/app.ts"), root),
///     Some("src/app.ts".to_string())
/// );
/// assert_eq!(to_workspace_relative(Path::new("/elsewhere/x.ts"), root), None);
/// ```
pub fn to_workspace_relative(path: &Path, workspace_root: &Path) -> Option<String> {
    path.strip_prefix(workspace_root)
        .ok()
        .and_then(|p| p.to_str())
        .map(str::to_owned)
}
