//! Cursor-based slicing of extracted text between fixed landmark phrases.
//!
//! Cover pages and roster blocks produced by the submission system are laid
//! out as `Label\nvalue\n...Next Label`, so a field value is "line N of the
//! window between two labels".

#[derive(Debug, Clone)]
pub struct LandmarkCursor<'a> {
    text: &'a str,
    position: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window<'a> {
    text: &'a str,
}

impl<'a> LandmarkCursor<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, position: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.position..]
    }

    /// Move the cursor to the next occurrence of `landmark`.
    pub fn find_next(&mut self, landmark: &str) -> Option<usize> {
        let offset = self.rest().find(landmark)?;
        self.position += offset;
        Some(self.position)
    }

    /// Text from `start` up to the first `end` after it, both searched from the
    /// cursor. The cursor does not move.
    pub fn window(&self, start: &str, end: &str) -> Option<Window<'a>> {
        let rest = self.rest();
        let start_index = rest.find(start)?;
        let end_index = start_index + rest[start_index..].find(end)?;
        Some(Window {
            text: &rest[start_index..end_index],
        })
    }

    /// Move the cursor just past the next occurrence of `landmark`.
    pub fn advance_past(&mut self, landmark: &str) -> Option<usize> {
        self.find_next(landmark)?;
        self.position += landmark.len();
        Some(self.position)
    }
}

impl<'a> Window<'a> {
    pub fn line(&self, index: usize) -> Option<&'a str> {
        self.text.split('\n').nth(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_is_bounded_by_the_first_end_after_start() {
        let text = "cage code\nname\nalpha\ncontact phone\nname\nbeta\ncontact phone";
        let mut cursor = LandmarkCursor::new(text);

        assert_eq!(cursor.find_next("name"), Some(10));
        let window = cursor.window("name", "contact phone").expect("window");
        assert_eq!(window.line(0), Some("name"));
        assert_eq!(window.line(1), Some("alpha"));

        cursor.advance_past("contact phone").expect("landmark present");
        let window = cursor.window("name", "contact phone").expect("second window");
        assert_eq!(window.line(1), Some("beta"));
    }

    #[test]
    fn missing_landmarks_yield_none_without_moving() {
        let mut cursor = LandmarkCursor::new("nothing to see\nhere");
        assert!(cursor.find_next("team member name").is_none());
        assert!(cursor.window("nothing", "absent").is_none());

        let window = cursor.window("nothing", "here").expect("cursor did not move");
        assert_eq!(window.line(0), Some("nothing to see"));
        assert_eq!(window.line(1), Some(""));
    }
}
