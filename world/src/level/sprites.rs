//! A fixed pool of sprite slots. Each live sprite sits on exactly one
//! per-sector chain and one per-status chain; free slots sit on a free chain
//! threaded through the status links. Inserts go to the head of a chain.

use log::trace;

use super::map_defs::Sprite;
use crate::WorldError;

/// Number of status classes a sprite can be filed under
pub const MAX_STATUS: usize = 1024;

#[derive(Debug, Default, Clone, Copy)]
struct Links {
    prev_sect: Option<usize>,
    next_sect: Option<usize>,
    prev_stat: Option<usize>,
    next_stat: Option<usize>,
}

pub struct SpriteList {
    sprites: Vec<Sprite>,
    links: Vec<Links>,
    live: Vec<bool>,
    head_sect: Vec<Option<usize>>,
    head_stat: Vec<Option<usize>>,
    free: Option<usize>,
    count: usize,
}

impl SpriteList {
    pub fn new(capacity: usize, num_sectors: usize) -> Self {
        let mut links = vec![Links::default(); capacity];
        for (i, l) in links.iter_mut().enumerate() {
            l.next_stat = if i + 1 < capacity { Some(i + 1) } else { None };
        }
        Self {
            sprites: vec![Sprite::default(); capacity],
            links,
            live: vec![false; capacity],
            head_sect: vec![None; num_sectors],
            head_stat: vec![None; MAX_STATUS],
            free: if capacity > 0 { Some(0) } else { None },
            count: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.sprites.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub fn is_live(&self, i: usize) -> bool {
        self.live.get(i).copied().unwrap_or(false)
    }

    pub fn get(&self, i: usize) -> Option<&Sprite> {
        if self.is_live(i) { Some(&self.sprites[i]) } else { None }
    }

    pub fn get_mut(&mut self, i: usize) -> Option<&mut Sprite> {
        if self.is_live(i) {
            Some(&mut self.sprites[i])
        } else {
            None
        }
    }

    fn check_sector(&self, s: usize) -> Result<(), WorldError> {
        if s >= self.head_sect.len() {
            return Err(WorldError::InvalidIndex {
                what: "sector",
                index: s,
            });
        }
        Ok(())
    }

    fn check_status(&self, s: usize) -> Result<(), WorldError> {
        if s >= MAX_STATUS {
            return Err(WorldError::InvalidIndex {
                what: "status",
                index: s,
            });
        }
        Ok(())
    }

    fn check_live(&self, i: usize) -> Result<(), WorldError> {
        if !self.is_live(i) {
            return Err(WorldError::InvalidIndex {
                what: "sprite",
                index: i,
            });
        }
        Ok(())
    }

    /// Take a free slot and file it under `sector` and `status`. The slot is
    /// reset to a default sprite.
    pub fn insert(&mut self, sector: usize, status: usize) -> Result<usize, WorldError> {
        self.check_sector(sector)?;
        self.check_status(status)?;
        let i = self.free.ok_or(WorldError::Capacity {
            what: "sprites",
            count: self.count + 1,
            max: self.capacity(),
        })?;
        self.free = self.links[i].next_stat;
        self.links[i] = Links::default();
        self.sprites[i] = Sprite::default();
        self.live[i] = true;
        self.count += 1;
        self.link_sector(i, sector);
        self.link_status(i, status);
        trace!("inserted sprite {} in sector {} status {}", i, sector, status);
        Ok(i)
    }

    /// Unlink the sprite and give its slot back
    pub fn delete(&mut self, i: usize) -> Result<(), WorldError> {
        self.check_live(i)?;
        self.unlink_sector(i);
        self.unlink_status(i);
        self.live[i] = false;
        self.count -= 1;
        self.links[i] = Links {
            next_stat: self.free,
            ..Links::default()
        };
        self.free = Some(i);
        Ok(())
    }

    pub fn change_sector(&mut self, i: usize, sector: usize) -> Result<(), WorldError> {
        self.check_live(i)?;
        self.check_sector(sector)?;
        if self.sprites[i].sector == sector {
            return Ok(());
        }
        self.unlink_sector(i);
        self.link_sector(i, sector);
        Ok(())
    }

    pub fn change_status(&mut self, i: usize, status: usize) -> Result<(), WorldError> {
        self.check_live(i)?;
        self.check_status(status)?;
        if self.sprites[i].status == status {
            return Ok(());
        }
        self.unlink_status(i);
        self.link_status(i, status);
        Ok(())
    }

    fn link_sector(&mut self, i: usize, sector: usize) {
        let head = self.head_sect[sector];
        self.links[i].prev_sect = None;
        self.links[i].next_sect = head;
        if let Some(h) = head {
            self.links[h].prev_sect = Some(i);
        }
        self.head_sect[sector] = Some(i);
        self.sprites[i].sector = sector;
    }

    fn unlink_sector(&mut self, i: usize) {
        let Links {
            prev_sect,
            next_sect,
            ..
        } = self.links[i];
        match prev_sect {
            Some(p) => self.links[p].next_sect = next_sect,
            None => self.head_sect[self.sprites[i].sector] = next_sect,
        }
        if let Some(n) = next_sect {
            self.links[n].prev_sect = prev_sect;
        }
        self.links[i].prev_sect = None;
        self.links[i].next_sect = None;
    }

    fn link_status(&mut self, i: usize, status: usize) {
        let head = self.head_stat[status];
        self.links[i].prev_stat = None;
        self.links[i].next_stat = head;
        if let Some(h) = head {
            self.links[h].prev_stat = Some(i);
        }
        self.head_stat[status] = Some(i);
        self.sprites[i].status = status;
    }

    fn unlink_status(&mut self, i: usize) {
        let Links {
            prev_stat,
            next_stat,
            ..
        } = self.links[i];
        match prev_stat {
            Some(p) => self.links[p].next_stat = next_stat,
            None => self.head_stat[self.sprites[i].status] = next_stat,
        }
        if let Some(n) = next_stat {
            self.links[n].prev_stat = prev_stat;
        }
        self.links[i].prev_stat = None;
        self.links[i].next_stat = None;
    }

    /// Sprites filed under `sector`, newest first. Empty for a bad index.
    pub fn in_sector(&self, sector: usize) -> ChainIter<'_> {
        ChainIter {
            list: self,
            next: self.head_sect.get(sector).copied().flatten(),
            by_sector: true,
        }
    }

    /// Sprites filed under `status`, newest first. Empty for a bad index.
    pub fn in_status(&self, status: usize) -> ChainIter<'_> {
        ChainIter {
            list: self,
            next: self.head_stat.get(status).copied().flatten(),
            by_sector: false,
        }
    }

    /// Every live slot in index order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Sprite)> {
        self.sprites
            .iter()
            .enumerate()
            .filter(|(i, _)| self.live[*i])
    }

    /// Walk every chain and check it agrees with the sprites filed in it
    pub fn validate(&self) -> Result<(), WorldError> {
        let mut seen_sect = vec![0u8; self.capacity()];
        let mut seen_stat = vec![0u8; self.capacity()];

        for (sector, head) in self.head_sect.iter().enumerate() {
            let mut prev = None;
            let mut next = *head;
            while let Some(i) = next {
                if !self.live[i] || self.sprites[i].sector != sector {
                    return Err(WorldError::SpriteLinks {
                        sprite: i,
                        reason: "on the wrong sector chain",
                    });
                }
                if self.links[i].prev_sect != prev {
                    return Err(WorldError::SpriteLinks {
                        sprite: i,
                        reason: "sector back link broken",
                    });
                }
                seen_sect[i] += 1;
                if seen_sect[i] > 1 {
                    return Err(WorldError::SpriteLinks {
                        sprite: i,
                        reason: "sector chain loops",
                    });
                }
                prev = Some(i);
                next = self.links[i].next_sect;
            }
        }

        for (status, head) in self.head_stat.iter().enumerate() {
            let mut prev = None;
            let mut next = *head;
            while let Some(i) = next {
                if !self.live[i] || self.sprites[i].status != status {
                    return Err(WorldError::SpriteLinks {
                        sprite: i,
                        reason: "on the wrong status chain",
                    });
                }
                if self.links[i].prev_stat != prev {
                    return Err(WorldError::SpriteLinks {
                        sprite: i,
                        reason: "status back link broken",
                    });
                }
                seen_stat[i] += 1;
                if seen_stat[i] > 1 {
                    return Err(WorldError::SpriteLinks {
                        sprite: i,
                        reason: "status chain loops",
                    });
                }
                prev = Some(i);
                next = self.links[i].next_stat;
            }
        }

        for i in 0..self.capacity() {
            let expect = self.live[i] as u8;
            if seen_sect[i] != expect || seen_stat[i] != expect {
                return Err(WorldError::SpriteLinks {
                    sprite: i,
                    reason: "not on exactly one sector and one status chain",
                });
            }
        }
        Ok(())
    }
}

pub struct ChainIter<'a> {
    list: &'a SpriteList,
    next: Option<usize>,
    by_sector: bool,
}

impl Iterator for ChainIter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let i = self.next?;
        let l = &self.list.links[i];
        self.next = if self.by_sector { l.next_sect } else { l.next_stat };
        Some(i)
    }
}
