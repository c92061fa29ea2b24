// rsdeploy/src/deploy/folder.rs
use crate::errors::Result;
use crate::service::{ItemKind, ReportingService};
use crate::utils::paths::{join_item_path, normalize_folder_path};

/// Deletes `folder_name` under `parent_path` if it exists, then creates it
/// again, leaving an empty folder. Returns the folder's full path.
///
/// Any failure here aborts the deployment.
pub async fn reset_folder<S: ReportingService>(
    service: &S,
    parent_path: &str,
    folder_name: &str,
) -> Result<String> {
    let parent_path = normalize_folder_path(parent_path);
    let folder_path = join_item_path(&parent_path, folder_name);

    let children = service.list_children(&parent_path).await?;
    if let Some(existing) = children.iter().find(|child| child.name == folder_name) {
        let existing_path = if existing.path.is_empty() {
            folder_path.as_str()
        } else {
            existing.path.as_str()
        };
        if existing.kind != ItemKind::Folder {
            tracing::warn!(path = existing_path, kind = existing.kind.as_str(), "replacing a non-folder item");
        }
        println!("🗑  Deleting existing folder {} and its contents...", existing_path);
        service.delete_item(existing_path).await?;
    }

    service.create_folder(folder_name, &parent_path).await?;
    println!("📂 Created folder {}", folder_path);
    Ok(folder_path)
}
