//! Provides logic for filtering store listings by name and extension.

use super::store::DriveItem;

/// A utility struct for filtering drive items.
///
/// This struct is stateless and provides methods as associated functions.
pub struct SearchEngine;

impl SearchEngine {
    /// Keeps the folders whose name contains `code`, ignoring case.
    pub fn folders_matching(items: &[DriveItem], code: &str) -> Vec<DriveItem> {
        items
            .iter()
            .filter(|item| item.is_folder && Self::matches_search_query(&item.name, code))
            .cloned()
            .collect()
    }

    /// Names of the spreadsheet files among `items`, in listing order.
    pub fn spreadsheet_names(items: &[DriveItem], extension: &str) -> Vec<String> {
        items
            .iter()
            .filter(|item| item.is_file && Self::is_spreadsheet(&item.name, extension))
            .map(|item| item.name.clone())
            .collect()
    }

    /// Checks if a name contains the search query, case-insensitively.
    pub fn matches_search_query(name: &str, query: &str) -> bool {
        name.to_lowercase().contains(&query.to_lowercase())
    }

    /// Checks if a file name ends with the spreadsheet extension, case-insensitively.
    pub fn is_spreadsheet(name: &str, extension: &str) -> bool {
        name.to_lowercase().ends_with(&extension.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_items() -> Vec<DriveItem> {
        vec![
            DriveItem::folder("1", "EP25005 - Raslavice"),
            DriveItem::folder("2", "ep25005 - raslavice"),
            DriveItem::folder("3", "EP25006 - Humenné"),
            DriveItem::file("4", "EP25005 karta stavby.xlsx", 100),
            DriveItem::file("5", "Karta stavby.XLSX", 100),
            DriveItem::file("6", "EP25005.pdf", 100),
        ]
    }

    #[test]
    fn test_folders_matching_is_case_insensitive_and_skips_files() {
        let result = SearchEngine::folders_matching(&create_test_items(), "Ep25005");
        let ids: Vec<_> = result.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_spreadsheet_names_match_extension_in_any_case() {
        let result = SearchEngine::spreadsheet_names(&create_test_items(), ".xlsx");
        assert_eq!(
            result,
            vec![
                "EP25005 karta stavby.xlsx".to_string(),
                "Karta stavby.XLSX".to_string()
            ]
        );
    }

    #[test]
    fn test_is_spreadsheet_requires_suffix() {
        assert!(SearchEngine::is_spreadsheet("a.xlsx", ".xlsx"));
        assert!(!SearchEngine::is_spreadsheet("a.xlsx.bak", ".xlsx"));
        assert!(!SearchEngine::is_spreadsheet("xlsx", ".xlsx"));
    }
}
