use rand::seq::SliceRandom;
use rand::Rng;

use crate::bank::CategoryConfig;
use crate::types::Question;

/// Build the ordered question sequence for one session.
///
/// Per category (quantity > 0): when the request covers every Christmas
/// question, all of them are taken and the rest is sampled from the other
/// questions; otherwise only Christmas questions are sampled. Short categories
/// yield fewer questions. The combined selection is shuffled once more so the
/// split does not leak into the order.
pub fn build_session_queue<R: Rng + ?Sized>(
    bank: &[Question],
    config: &CategoryConfig,
    rng: &mut R,
) -> Vec<Question> {
    let mut queue = Vec::new();

    for entry in config.entries.iter().filter(|e| e.quantity > 0) {
        let qty = entry.quantity as usize;
        let (mut christmas, mut normal): (Vec<&Question>, Vec<&Question>) = bank
            .iter()
            .filter(|q| q.category == entry.category)
            .partition(|q| q.is_christmas());

        if qty >= christmas.len() {
            let fill = qty - christmas.len();
            queue.extend(christmas.into_iter().cloned());
            normal.shuffle(rng);
            queue.extend(normal.into_iter().take(fill).cloned());
        } else {
            christmas.shuffle(rng);
            queue.extend(christmas.into_iter().take(qty).cloned());
        }
    }

    queue.shuffle(rng);
    queue
}
