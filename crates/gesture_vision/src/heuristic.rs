//! 关键点启发式分类
//!
//! 指尖比下方参考关节更靠上（y 更小）即视为手指伸直。
//! 五根手指的伸直状态按固定优先级组合成手势，先命中者为准。

use gesture_core::GestureLabel;

use crate::{ClassifierFault, GestureClassifier, HandLandmarks, Joint, Landmark};

/// (指尖, 参考关节)，顺序：拇指、食指、中指、无名指、小指
const FINGERS: [(Joint, Joint); 5] = [
    (Joint::ThumbTip, Joint::ThumbIp),
    (Joint::IndexTip, Joint::IndexPip),
    (Joint::MiddleTip, Joint::MiddlePip),
    (Joint::RingTip, Joint::RingPip),
    (Joint::PinkyTip, Joint::PinkyPip),
];

/// 五根手指是否伸直
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FingerState(pub [bool; 5]);

impl FingerState {
    pub fn from_hand(hand: &HandLandmarks) -> Self {
        let mut up = [false; 5];
        for (slot, (tip, base)) in up.iter_mut().zip(FINGERS) {
            *slot = hand.joint(tip).y < hand.joint(base).y;
        }
        Self(up)
    }

    pub fn thumb(&self) -> bool {
        self.0[0]
    }

    /// 除拇指外伸直的手指数
    pub fn others_up(&self) -> usize {
        self.0[1..].iter().filter(|up| **up).count()
    }

    /// 按优先级匹配手势
    pub fn gesture(&self) -> Option<GestureLabel> {
        let [thumb, index, middle, ring, pinky] = self.0;
        let others = self.others_up();

        if others == 4 {
            Some(GestureLabel::OpenPalm)
        } else if !thumb && others == 0 {
            Some(GestureLabel::Fist)
        } else if thumb && others == 0 {
            Some(GestureLabel::ThumbUp)
        } else if !thumb && others == 1 {
            Some(GestureLabel::ThumbDown)
        } else if index && pinky && !middle && !ring {
            Some(GestureLabel::Rock)
        } else {
            None
        }
    }
}

/// 基于第一只手关键点的分类器
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicClassifier;

impl HeuristicClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn try_classify(
        &self,
        hands: &[Vec<Landmark>],
    ) -> Result<Option<GestureLabel>, ClassifierFault> {
        let first = hands.first().ok_or(ClassifierFault::NoHand)?;
        let hand = HandLandmarks::new(first.clone())?;
        Ok(FingerState::from_hand(&hand).gesture())
    }
}

impl GestureClassifier<[Vec<Landmark>]> for HeuristicClassifier {
    fn classify(&mut self, hands: &[Vec<Landmark>]) -> Option<GestureLabel> {
        match self.try_classify(hands) {
            Ok(label) => label,
            Err(ClassifierFault::NoHand) => None,
            Err(e) => {
                log::debug!("heuristic classifier: {}", e);
                None
            }
        }
    }
}
