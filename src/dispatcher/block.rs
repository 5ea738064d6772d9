use crate::registry::PropertyDescriptor;

/// Largest register count a single Modbus read may ask for.
pub const MODBUS_MAX_READ: u16 = 125;

pub const DEFAULT_BLOCK_SIZE: u16 = 40;

/// A contiguous register span covering one or more properties.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub offset: u16,
    pub length: u16,
    pub members: Vec<PropertyDescriptor>,
}

impl Block {
    fn start(descriptor: &PropertyDescriptor) -> Self {
        Self {
            offset: descriptor.offset,
            length: descriptor.length,
            members: vec![descriptor.clone()],
        }
    }

    fn end(&self) -> u32 {
        u32::from(self.offset) + u32::from(self.length)
    }

    /// The member's words within a response to this block.
    pub fn slice<'a>(&self, member: &PropertyDescriptor, words: &'a [u16]) -> Option<&'a [u16]> {
        let start = usize::from(member.offset.checked_sub(self.offset)?);
        words.get(start..start + usize::from(member.length))
    }
}

/// Group readable descriptors into as few reads as possible.
///
/// Only registers that belong to a property are ever requested: a block
/// grows while the next property starts exactly where it ends and the
/// total stays within `max_block_size`. A property longer than the limit
/// gets a block of its own.
pub fn plan<'a>(
    descriptors: impl IntoIterator<Item = &'a PropertyDescriptor>,
    max_block_size: u16,
) -> Vec<Block> {
    let max_block_size = u32::from(max_block_size.clamp(1, MODBUS_MAX_READ));

    let mut readable: Vec<&PropertyDescriptor> = descriptors
        .into_iter()
        .filter(|d| d.access.is_readable())
        .collect();
    readable.sort_by_key(|d| d.offset);

    let mut blocks: Vec<Block> = Vec::new();
    for descriptor in readable {
        match blocks.last_mut() {
            Some(block)
                if block.end() == u32::from(descriptor.offset)
                    && descriptor.end() - u32::from(block.offset) <= max_block_size =>
            {
                block.length += descriptor.length;
                block.members.push(descriptor.clone());
            }
            _ => blocks.push(Block::start(descriptor)),
        }
    }
    blocks
}
