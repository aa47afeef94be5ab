//! 手部关键点

use serde::Deserialize;

use crate::ClassifierFault;

/// 每只手的关键点数量
pub const LANDMARK_COUNT: usize = 21;

/// 归一化图像坐标下的一个关键点（y 向下增大）
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(from = "LandmarkRepr")]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// 接受 `[x, y]`、`[x, y, z]` 或 `{"x":..,"y":..,"z":..}`
#[derive(Deserialize)]
#[serde(untagged)]
enum LandmarkRepr {
    Xyz([f32; 3]),
    Xy([f32; 2]),
    Named {
        x: f32,
        y: f32,
        #[serde(default)]
        z: f32,
    },
}

impl From<LandmarkRepr> for Landmark {
    fn from(repr: LandmarkRepr) -> Self {
        match repr {
            LandmarkRepr::Xyz([x, y, z]) => Self { x, y, z },
            LandmarkRepr::Xy([x, y]) => Self { x, y, z: 0.0 },
            LandmarkRepr::Named { x, y, z } => Self { x, y, z },
        }
    }
}

/// 21 个关键点的编号
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Joint {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

impl Joint {
    pub fn index(self) -> usize {
        self as usize
    }
}

/// 一只手，恰好 21 个关键点
#[derive(Debug, Clone, PartialEq)]
pub struct HandLandmarks {
    points: Vec<Landmark>,
}

impl HandLandmarks {
    pub fn new(points: Vec<Landmark>) -> Result<Self, ClassifierFault> {
        if points.len() != LANDMARK_COUNT {
            return Err(ClassifierFault::LandmarkCount {
                expected: LANDMARK_COUNT,
                actual: points.len(),
            });
        }
        Ok(Self { points })
    }

    pub fn joint(&self, joint: Joint) -> Landmark {
        self.points[joint.index()]
    }

    pub fn points(&self) -> &[Landmark] {
        &self.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joint_indices() {
        assert_eq!(Joint::Wrist.index(), 0);
        assert_eq!(Joint::ThumbTip.index(), 4);
        assert_eq!(Joint::IndexPip.index(), 6);
        assert_eq!(Joint::PinkyTip.index(), 20);
    }

    #[test]
    fn test_requires_exactly_21_points() {
        assert!(HandLandmarks::new(vec![Landmark::default(); 21]).is_ok());
        assert!(matches!(
            HandLandmarks::new(vec![Landmark::default(); 20]),
            Err(ClassifierFault::LandmarkCount { actual: 20, .. })
        ));
        assert!(HandLandmarks::new(vec![Landmark::default(); 22]).is_err());
    }
}
