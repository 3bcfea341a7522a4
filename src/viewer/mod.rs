//! Full-screen viewer state.
//!
//! The viewer walks a sequence of photo ids captured when it was opened
//! (normally the current projection). It never touches the store itself:
//! edits come back as a [`PhotoPatch`] for the caller to apply.

use crate::store::{parse_tag_list, Photo, PhotoId, PhotoPatch};

/// Pending title/tag edits for the photo on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub photo_id: PhotoId,
    pub title: String,
    /// Comma-separated, as typed.
    pub tags: String,
}

#[derive(Debug, Clone, Default)]
pub struct Viewer {
    sequence: Vec<PhotoId>,
    index: usize,
    open: bool,
    rotation: u16,
    zoomed: bool,
    editing: Option<EditSession>,
}

impl Viewer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open on `id` within `sequence`. Returns false, leaving the viewer
    /// closed, when the id is not part of the sequence.
    pub fn open(&mut self, id: &PhotoId, sequence: Vec<PhotoId>) -> bool {
        let Some(index) = sequence.iter().position(|p| p == id) else {
            return false;
        };
        self.sequence = sequence;
        self.index = index;
        self.open = true;
        self.reset_view();
        true
    }

    pub fn close(&mut self) {
        self.open = false;
        self.reset_view();
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn current(&self) -> Option<&PhotoId> {
        if self.open {
            self.sequence.get(self.index)
        } else {
            None
        }
    }

    /// 1-based position and sequence length, `(0, 0)` while closed.
    pub fn position(&self) -> (usize, usize) {
        if self.current().is_some() {
            (self.index + 1, self.sequence.len())
        } else {
            (0, 0)
        }
    }

    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 >= self.sequence.len()
    }

    /// Step through the sequence, wrapping at both ends.
    pub fn navigate(&mut self, delta: isize) {
        let len = self.sequence.len();
        if !self.open || len == 0 {
            return;
        }
        let len = len as isize;
        self.index = (self.index as isize + delta).rem_euclid(len) as usize;
        self.reset_view();
    }

    pub fn next(&mut self) {
        self.navigate(1);
    }

    pub fn previous(&mut self) {
        self.navigate(-1);
    }

    /// Rotation of the displayed image in degrees (0, 90, 180, 270).
    pub fn rotation(&self) -> u16 {
        self.rotation
    }

    pub fn rotate(&mut self) -> u16 {
        self.rotation = (self.rotation + 90) % 360;
        self.rotation
    }

    pub fn is_zoomed(&self) -> bool {
        self.zoomed
    }

    pub fn toggle_zoom(&mut self) -> bool {
        self.zoomed = !self.zoomed;
        self.zoomed
    }

    /// Escape: leave zoom first, close on the second press.
    pub fn escape(&mut self) {
        if self.zoomed {
            self.zoomed = false;
        } else {
            self.close();
        }
    }

    // === Editing ===

    pub fn begin_edit(&mut self, photo: &Photo) -> Option<&mut EditSession> {
        if self.current() != Some(&photo.id) {
            return None;
        }
        self.editing = Some(EditSession {
            photo_id: photo.id.clone(),
            title: photo.title.clone(),
            tags: photo.tags.join(", "),
        });
        self.editing.as_mut()
    }

    pub fn edit_session(&mut self) -> Option<&mut EditSession> {
        self.editing.as_mut()
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Finish editing, producing the patch to apply to the store.
    pub fn commit_edit(&mut self) -> Option<(PhotoId, PhotoPatch)> {
        let session = self.editing.take()?;
        let patch = PhotoPatch::new()
            .title(session.title.trim())
            .tags(parse_tag_list(&session.tags));
        Some((session.photo_id, patch))
    }

    /// Drop `id` from the sequence after it was deleted; the viewer closes
    /// if it was showing that photo.
    pub fn remove(&mut self, id: &PhotoId) {
        let Some(pos) = self.sequence.iter().position(|p| p == id) else {
            return;
        };
        let was_current = self.open && pos == self.index;
        self.sequence.remove(pos);

        if was_current || self.sequence.is_empty() {
            self.close();
            self.index = 0;
        } else if pos < self.index {
            self.index -= 1;
        }
    }

    fn reset_view(&mut self) {
        self.rotation = 0;
        self.zoomed = false;
        self.editing = None;
    }
}

/// File name offered when downloading: the title with the original
/// extension, or the original name when there is no title.
pub fn download_name(photo: &Photo) -> String {
    let title = photo.title.trim();
    if title.is_empty() {
        return photo.name.clone();
    }
    match photo.name.rsplit_once('.') {
        Some((_, ext)) => format!("{}.{}", title, ext),
        None => format!("{}.{}", title, photo.name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{PhotoMetadata, UNCATEGORIZED};
    use chrono::Utc;

    fn ids(names: &[&str]) -> Vec<PhotoId> {
        names.iter().map(|n| PhotoId::from(*n)).collect()
    }

    fn photo(id: &str, title: &str, tags: &[&str]) -> Photo {
        Photo {
            id: PhotoId::from(id),
            name: format!("{}.png", id),
            mime_type: "image/png".to_string(),
            byte_size: 0,
            primary_image_ref: "d".to_string(),
            thumbnail_image_ref: "t".to_string(),
            upload_timestamp: Utc::now(),
            title: title.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            category: UNCATEGORIZED.to_string(),
            favorite: false,
            metadata: PhotoMetadata::default(),
        }
    }

    #[test]
    fn test_open_requires_member() {
        let mut viewer = Viewer::new();
        assert!(!viewer.open(&PhotoId::from("x"), ids(&["a", "b"])));
        assert!(!viewer.is_open());
        assert!(viewer.open(&PhotoId::from("b"), ids(&["a", "b"])));
        assert_eq!(viewer.current().map(PhotoId::as_str), Some("b"));
        assert_eq!(viewer.position(), (2, 2));
        assert!(viewer.is_last());
    }

    #[test]
    fn test_position_is_zero_when_closed() {
        let mut viewer = Viewer::new();
        assert_eq!(viewer.position(), (0, 0));

        viewer.open(&PhotoId::from("b"), ids(&["a", "b", "c"]));
        assert_eq!(viewer.position(), (2, 3));

        viewer.close();
        assert_eq!(viewer.position(), (0, 0));
    }

    #[test]
    fn test_navigation_wraps_and_resets_view() {
        let mut viewer = Viewer::new();
        viewer.open(&PhotoId::from("a"), ids(&["a", "b", "c"]));
        viewer.rotate();
        viewer.toggle_zoom();

        viewer.previous();
        assert_eq!(viewer.current().map(PhotoId::as_str), Some("c"));
        assert_eq!(viewer.rotation(), 0);
        assert!(!viewer.is_zoomed());

        viewer.next();
        assert_eq!(viewer.current().map(PhotoId::as_str), Some("a"));
        assert!(viewer.is_first());
    }

    #[test]
    fn test_rotation_cycles() {
        let mut viewer = Viewer::new();
        let angles: Vec<u16> = (0..5).map(|_| viewer.rotate()).collect();
        assert_eq!(angles, vec![90, 180, 270, 0, 90]);
    }

    #[test]
    fn test_escape_unzooms_then_closes() {
        let mut viewer = Viewer::new();
        viewer.open(&PhotoId::from("a"), ids(&["a"]));
        viewer.toggle_zoom();
        viewer.escape();
        assert!(viewer.is_open());
        viewer.escape();
        assert!(!viewer.is_open());
        assert!(viewer.current().is_none());
    }

    #[test]
    fn test_edit_session_produces_patch() {
        let current = photo("a", "Old", &["x", "y"]);
        let mut viewer = Viewer::new();
        viewer.open(&current.id, ids(&["a"]));

        let session = viewer.begin_edit(&current).unwrap();
        assert_eq!(session.tags, "x, y");
        session.title = "  New title ".to_string();
        session.tags = "sea, , sun ,".to_string();

        let (id, patch) = viewer.commit_edit().unwrap();
        assert_eq!(id, current.id);
        assert_eq!(patch, PhotoPatch::new().title("New title").tags(["sea", "sun"]));
        assert!(!viewer.is_editing());
    }

    #[test]
    fn test_clearing_tags_in_edit_yields_empty_list() {
        let current = photo("a", "", &["x"]);
        let mut viewer = Viewer::new();
        viewer.open(&current.id, ids(&["a"]));
        viewer.begin_edit(&current).unwrap().tags.clear();

        let (_, patch) = viewer.commit_edit().unwrap();
        assert_eq!(patch.tags, Some(Vec::new()));
    }

    #[test]
    fn test_begin_edit_rejects_other_photo() {
        let mut viewer = Viewer::new();
        viewer.open(&PhotoId::from("a"), ids(&["a", "b"]));
        assert!(viewer.begin_edit(&photo("b", "", &[])).is_none());
    }

    #[test]
    fn test_remove_current_closes() {
        let mut viewer = Viewer::new();
        viewer.open(&PhotoId::from("c"), ids(&["a", "b", "c"]));
        viewer.remove(&PhotoId::from("a"));
        assert_eq!(viewer.current().map(PhotoId::as_str), Some("c"));
        viewer.remove(&PhotoId::from("c"));
        assert!(!viewer.is_open());
    }

    #[test]
    fn test_download_name() {
        assert_eq!(download_name(&photo("img1", "", &[])), "img1.png");
        assert_eq!(download_name(&photo("img1", "Sunset", &[])), "Sunset.png");
    }
}
