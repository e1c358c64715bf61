//! The presentable render pass.
//!
//! One color attachment in the swapchain format, cleared on load and stored,
//! transitioning from `UNDEFINED` to `PRESENT_SRC_KHR`. One graphics subpass,
//! no depth/stencil and no explicit subpass dependencies.

use ash::vk;
use tracing::debug;

use crate::error::{RhiResult, VkCallExt};

/// Describes the single color attachment for `format`.
pub fn color_attachment(format: vk::Format) -> vk::AttachmentDescription {
    vk::AttachmentDescription::default()
        .format(format)
        .samples(vk::SampleCountFlags::TYPE_1)
        .load_op(vk::AttachmentLoadOp::CLEAR)
        .store_op(vk::AttachmentStoreOp::STORE)
        .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
        .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
        .initial_layout(vk::ImageLayout::UNDEFINED)
        .final_layout(vk::ImageLayout::PRESENT_SRC_KHR)
}

/// Reference to attachment 0 in the layout used while rendering.
pub const COLOR_ATTACHMENT_REF: vk::AttachmentReference = vk::AttachmentReference {
    attachment: 0,
    layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
};

/// Creates the presentable render pass on `device`.
///
/// # Errors
///
/// Returns an error if `vkCreateRenderPass` fails.
pub fn create_render_pass(device: &ash::Device, format: vk::Format) -> RhiResult<vk::RenderPass> {
    let attachments = [color_attachment(format)];
    let color_refs = [COLOR_ATTACHMENT_REF];

    let subpasses = [vk::SubpassDescription::default()
        .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
        .color_attachments(&color_refs)];

    let create_info = vk::RenderPassCreateInfo::default()
        .attachments(&attachments)
        .subpasses(&subpasses);

    let render_pass = unsafe {
        device
            .create_render_pass(&create_info, None)
            .call("vkCreateRenderPass")?
    };
    debug!("Render pass created for format {:?}", format);

    Ok(render_pass)
}
