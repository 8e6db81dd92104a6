use derive_more::Display;
use std::ops::{Index, IndexMut};

/// One of the four fixed camera positions of a capture.
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Camera {
    #[display("front")]
    Front,
    #[display("back")]
    Back,
    #[display("left")]
    Left,
    #[display("right")]
    Right,
}

impl Camera {
    /// Front first: it is the authoritative track in grid playback.
    pub const ALL: [Camera; 4] = [Camera::Front, Camera::Back, Camera::Left, Camera::Right];

    /// File name suffix used by the recorder, e.g. `...-left_repeater.mp4`.
    pub fn file_suffix(self) -> &'static str {
        match self {
            Camera::Front => "front",
            Camera::Back => "back",
            Camera::Left => "left_repeater",
            Camera::Right => "right_repeater",
        }
    }

    pub fn from_file_suffix(suffix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|cam| cam.file_suffix() == suffix)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CameraSet<T> {
    pub front: T,
    pub back: T,
    pub left: T,
    pub right: T,
}

impl<T> CameraSet<T> {
    pub fn from_fn(mut f: impl FnMut(Camera) -> T) -> Self {
        Self {
            front: f(Camera::Front),
            back: f(Camera::Back),
            left: f(Camera::Left),
            right: f(Camera::Right),
        }
    }

    pub fn map<U>(self, mut f: impl FnMut(Camera, T) -> U) -> CameraSet<U> {
        CameraSet {
            front: f(Camera::Front, self.front),
            back: f(Camera::Back, self.back),
            left: f(Camera::Left, self.left),
            right: f(Camera::Right, self.right),
        }
    }

    pub fn each_ref(&self) -> CameraSet<&T> {
        CameraSet {
            front: &self.front,
            back: &self.back,
            left: &self.left,
            right: &self.right,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Camera, &T)> {
        Camera::ALL.into_iter().map(move |cam| (cam, &self[cam]))
    }
}

impl<T> CameraSet<Option<T>> {
    /// `Some` only when every camera has a value.
    pub fn transpose(self) -> Option<CameraSet<T>> {
        Some(CameraSet {
            front: self.front?,
            back: self.back?,
            left: self.left?,
            right: self.right?,
        })
    }
}

impl<T> Index<Camera> for CameraSet<T> {
    type Output = T;

    fn index(&self, camera: Camera) -> &T {
        match camera {
            Camera::Front => &self.front,
            Camera::Back => &self.back,
            Camera::Left => &self.left,
            Camera::Right => &self.right,
        }
    }
}

impl<T> IndexMut<Camera> for CameraSet<T> {
    fn index_mut(&mut self, camera: Camera) -> &mut T {
        match camera {
            Camera::Front => &mut self.front,
            Camera::Back => &mut self.back,
            Camera::Left => &mut self.left,
            Camera::Right => &mut self.right,
        }
    }
}
