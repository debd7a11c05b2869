//! Lists the configured sites and their categories.

use crate::site::SiteCatalog;

pub struct SitesCommand<'a> {
    catalog: &'a SiteCatalog,
}

impl<'a> SitesCommand<'a> {
    pub fn new(catalog: &'a SiteCatalog) -> Self {
        Self { catalog }
    }

    /// Renders one row per category.
    pub fn execute(&self) -> String {
        if self.catalog.sites.is_empty() {
            return "No sites configured.".to_string();
        }

        let mut lines = Vec::new();
        lines.push(format!("{:<12} {:<8} {:<16} {:<9} {}", "Site", "Mode", "Category", "Max pages", "URL"));
        lines.push(format!("{:-<12} {:-<8} {:-<16} {:-<9} {:-<30}", "", "", "", "", ""));

        for (site_key, site) in &self.catalog.sites {
            for (category_key, category) in &site.categories {
                lines.push(format!(
                    "{:<12} {:<8} {:<16} {:<9} {}",
                    site_key,
                    site.mode.to_string(),
                    category_key,
                    category.max_pages,
                    site.category_url(category)
                ));
            }
        }

        lines.join("\n")
    }
}
