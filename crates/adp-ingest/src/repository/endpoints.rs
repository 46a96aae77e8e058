//! Repository endpoint URL builders

/// Draft record collection (create)
pub fn records_url(base_url: &str) -> String {
    format!("{}/api/records", base_url)
}

/// One record
pub fn record_url(base_url: &str, id: &str) -> String {
    format!("{}/api/records/{}", base_url, id)
}

/// Draft of a record (read/update/delete; POST derives a draft from a
/// published record)
pub fn draft_url(base_url: &str, id: &str) -> String {
    format!("{}/api/records/{}/draft", base_url, id)
}

/// Publish action of a draft
pub fn publish_url(base_url: &str, id: &str) -> String {
    format!("{}/api/records/{}/draft/actions/publish", base_url, id)
}

/// New-version action of a published record
pub fn versions_url(base_url: &str, id: &str) -> String {
    format!("{}/api/records/{}/versions", base_url, id)
}

/// File listing of a published record
pub fn record_files_url(base_url: &str, id: &str) -> String {
    format!("{}/api/records/{}/files", base_url, id)
}

/// File listing of a draft (POST registers keys for upload)
pub fn draft_files_url(base_url: &str, id: &str) -> String {
    format!("{}/api/records/{}/draft/files", base_url, id)
}

/// Import-previous-files action of a new-version draft
pub fn import_files_url(base_url: &str, id: &str) -> String {
    format!("{}/api/records/{}/draft/actions/files-import", base_url, id)
}

/// One draft file
pub fn draft_file_url(base_url: &str, id: &str, key: &str) -> String {
    format!("{}/api/records/{}/draft/files/{}", base_url, id, key)
}

/// Content of a draft file
pub fn draft_file_content_url(base_url: &str, id: &str, key: &str) -> String {
    format!("{}/api/records/{}/draft/files/{}/content", base_url, id, key)
}

/// Commit action of a draft file upload
pub fn draft_file_commit_url(base_url: &str, id: &str, key: &str) -> String {
    format!("{}/api/records/{}/draft/files/{}/commit", base_url, id, key)
}

/// Content of a published record's file
pub fn record_file_content_url(base_url: &str, id: &str, key: &str) -> String {
    format!("{}/api/records/{}/files/{}/content", base_url, id, key)
}

/// Search over the caller's own records, drafts included
pub fn user_records_url(base_url: &str) -> String {
    format!("{}/api/user/records", base_url)
}

/// Public landing page of a record
pub fn landing_page_url(base_url: &str, id: &str) -> String {
    format!("{}/records/{}", base_url, id)
}
