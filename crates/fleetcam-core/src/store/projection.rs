// ── Clip projection ──
//
// Pure reconciliation of change events into an ordered, id-keyed view.
// Newest clips sit at the front; updates keep a record's position.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::trace;

use crate::model::{Clip, ClipChange, ClipId};

/// Read-only local copy of one device's clip records.
#[derive(Debug, Clone, Default)]
pub struct ClipProjection {
    serial: String,
    clips: IndexMap<ClipId, Arc<Clip>>,
}

impl ClipProjection {
    pub fn new(serial: impl Into<String>) -> Self {
        Self {
            serial: serial.into(),
            clips: IndexMap::new(),
        }
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }

    /// Replace the contents with a point-query result, newest first.
    /// Records for other devices are skipped; duplicate ids keep the
    /// newest copy.
    pub fn seed(&mut self, clips: Vec<Clip>) {
        let mut clips: Vec<Clip> = clips
            .into_iter()
            .filter(|c| c.serial == self.serial)
            .collect();
        clips.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        self.clips.clear();
        for clip in clips {
            self.clips.entry(clip.id).or_insert_with(|| Arc::new(clip));
        }
    }

    /// Apply one change event. Returns `true` if the view changed.
    ///
    /// - Insert prepends, or acts as an Update when the id is known.
    /// - Update replaces in place; unknown ids are ignored.
    /// - Delete removes by id; unknown ids are ignored.
    /// - Events for another serial are ignored.
    pub fn apply(&mut self, change: ClipChange) -> bool {
        if change.serial().is_some_and(|s| s != self.serial) {
            trace!(clip_id = %change.id(), "ignoring change for another device");
            return false;
        }

        match change {
            ClipChange::Insert { new } => {
                if self.clips.contains_key(&new.id) {
                    self.replace(new)
                } else {
                    self.clips.shift_insert(0, new.id, Arc::new(new));
                    true
                }
            }
            ClipChange::Update { new } => self.replace(new),
            ClipChange::Delete { old } => self.clips.shift_remove(&old.id).is_some(),
        }
    }

    fn replace(&mut self, clip: Clip) -> bool {
        match self.clips.get_mut(&clip.id) {
            Some(existing) if **existing == clip => false,
            Some(existing) => {
                *existing = Arc::new(clip);
                true
            }
            None => {
                trace!(clip_id = %clip.id, "update for a clip not in view");
                false
            }
        }
    }

    pub fn get(&self, id: ClipId) -> Option<&Arc<Clip>> {
        self.clips.get(&id)
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Clip>> {
        self.clips.values()
    }

    /// Ordered copy for publishing to subscribers.
    pub fn snapshot(&self) -> Arc<Vec<Arc<Clip>>> {
        Arc::new(self.clips.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::clip::tests::clip;
    use crate::model::{ClipKey, ClipStatus};
    use pretty_assertions::assert_eq;

    fn ids(p: &ClipProjection) -> Vec<i64> {
        p.iter().map(|c| c.id.0).collect()
    }

    #[test]
    fn insert_then_update_yields_one_updated_record() {
        let mut p = ClipProjection::new("SN1");
        assert!(p.apply(ClipChange::Insert {
            new: clip(5, ClipStatus::Receiving)
        }));
        assert!(p.apply(ClipChange::Update {
            new: clip(5, ClipStatus::Ready)
        }));

        assert_eq!(p.len(), 1);
        assert_eq!(p.get(ClipId(5)).map(|c| c.status), Some(ClipStatus::Ready));
    }

    #[test]
    fn delete_before_insert_is_a_noop() {
        let mut p = ClipProjection::new("SN1");
        let changed = p.apply(ClipChange::Delete {
            old: ClipKey {
                id: ClipId(5),
                serial: None,
            },
        });
        assert!(!changed);
        assert!(p.is_empty());
    }

    #[test]
    fn update_for_unknown_id_is_ignored() {
        let mut p = ClipProjection::new("SN1");
        assert!(!p.apply(ClipChange::Update {
            new: clip(8, ClipStatus::Ready)
        }));
        assert!(p.is_empty());
    }

    #[test]
    fn duplicate_insert_updates_in_place() {
        let mut p = ClipProjection::new("SN1");
        for id in [1, 2, 3] {
            p.apply(ClipChange::Insert {
                new: clip(id, ClipStatus::Receiving),
            });
        }
        assert_eq!(ids(&p), vec![3, 2, 1]);

        let mut again = clip(2, ClipStatus::Receiving);
        again.progress_percent = 40;
        assert!(p.apply(ClipChange::Insert { new: again }));

        assert_eq!(ids(&p), vec![3, 2, 1]);
        assert_eq!(p.get(ClipId(2)).map(|c| c.progress_percent), Some(40));
    }

    #[test]
    fn replaying_the_same_update_reports_no_change() {
        let mut p = ClipProjection::new("SN1");
        p.apply(ClipChange::Insert {
            new: clip(1, ClipStatus::Ready),
        });
        assert!(!p.apply(ClipChange::Update {
            new: clip(1, ClipStatus::Ready)
        }));
    }

    #[test]
    fn progress_is_taken_verbatim_even_if_it_goes_backwards() {
        let mut p = ClipProjection::new("SN1");
        let mut ahead = clip(1, ClipStatus::Receiving);
        ahead.progress_percent = 80;
        p.apply(ClipChange::Insert { new: ahead });

        let mut behind = clip(1, ClipStatus::Receiving);
        behind.progress_percent = 30;
        p.apply(ClipChange::Update { new: behind });

        assert_eq!(p.get(ClipId(1)).map(|c| c.progress_percent), Some(30));
    }

    #[test]
    fn other_devices_are_filtered() {
        let mut p = ClipProjection::new("SN1");
        let mut foreign = clip(1, ClipStatus::Ready);
        foreign.serial = "SN2".into();

        assert!(!p.apply(ClipChange::Insert {
            new: foreign.clone()
        }));
        p.seed(vec![foreign, clip(2, ClipStatus::Ready)]);
        assert_eq!(ids(&p), vec![2]);
    }

    #[test]
    fn seed_orders_newest_first() {
        let mut p = ClipProjection::new("SN1");
        p.seed(vec![
            clip(1, ClipStatus::Ready),
            clip(3, ClipStatus::Failed),
            clip(2, ClipStatus::Completed),
        ]);
        assert_eq!(ids(&p), vec![3, 2, 1]);

        p.apply(ClipChange::Delete {
            old: ClipKey {
                id: ClipId(2),
                serial: Some("SN1".into()),
            },
        });
        assert_eq!(ids(&p), vec![3, 1]);
    }
}
