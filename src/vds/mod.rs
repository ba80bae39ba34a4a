//! Volume Descriptor Sequence: the nine tagged descriptor types
//! recorded in the main/reserve VDS extents the Anchor Volume
//! Descriptor Pointer locates.

pub mod anchor;
pub mod impl_use;
pub mod integrity;
pub mod logical_volume;
pub mod partition;
pub mod primary;
pub mod terminating;
pub mod unallocated;

pub use anchor::AnchorVolumeDescriptorPointer;
pub use impl_use::{ImplementationUseVolumeDescriptor, LogicalVolumeInformation};
pub use integrity::{
    LogicalVolumeHeaderDescriptor, LogicalVolumeImplementationUse,
    LogicalVolumeIntegrityDescriptor,
};
pub use logical_volume::LogicalVolumeDescriptor;
pub use partition::PartitionDescriptor;
pub use primary::PrimaryVolumeDescriptor;
pub use terminating::TerminatingDescriptor;
pub use unallocated::UnallocatedSpaceDescriptor;
