use skyisle_scene::Renderer;

use crate::error::ExploreError;

/// The page the explore view lives in: a landing section with an explore
/// button, and a hidden map container that becomes the render target.
pub trait PageHost {
    /// Render target found inside the map container.
    type Renderer: Renderer;

    /// Whether the landing section offers an explore button.
    fn has_explore_button(&self) -> bool;

    /// Hide the landing content.
    fn hide_landing(&mut self);

    /// Show the map container and hand over its render target, or `None`
    /// when the page has no container.
    fn reveal_map_container(&mut self) -> Option<Self::Renderer>;
}

/// Check that the page can start the explore view at all.
pub fn wire_explore_button<H: PageHost>(host: &H) -> Result<(), ExploreError> {
    if host.has_explore_button() {
        tracing::debug!("explore button wired");
        Ok(())
    } else {
        tracing::error!("explore button not found");
        Err(ExploreError::MissingExploreButton)
    }
}
