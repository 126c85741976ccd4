//! Canned edit instructions.

use serde::Serialize;

/// A one-click edit instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PresetPrompt {
    /// Short machine-friendly name, e.g. `cyberpunk-vibe`.
    pub key: &'static str,
    /// Button label.
    pub label: &'static str,
    /// Instruction sent to the model, verbatim.
    pub text: &'static str,
    /// Display icon.
    pub icon: &'static str,
}

/// All presets, in display order.
pub const PRESETS: &[PresetPrompt] = &[
    PresetPrompt {
        key: "high-quality-portrait",
        label: "High Quality Portrait",
        text: "Enhance this image to high quality DSLR portrait, improve skin texture, hair details, lighting, strict consistency with original face and pose.",
        icon: "✨",
    },
    PresetPrompt {
        key: "cyberpunk-vibe",
        label: "Cyberpunk Vibe",
        text: "Give this image a futuristic cyberpunk neon aesthetic with blue and pink lighting, while keeping the subject recognizable.",
        icon: "🌃",
    },
    PresetPrompt {
        key: "professional-studio",
        label: "Professional Studio",
        text: "Change background to a clean professional dark studio backdrop, soft rim lighting, high contrast.",
        icon: "📸",
    },
    PresetPrompt {
        key: "sketch-style",
        label: "Sketch Style",
        text: "Convert this image into a high detail pencil sketch drawing.",
        icon: "✏️",
    },
    PresetPrompt {
        key: "nano-banana",
        label: "High Fidelity Enhancement (Nano Banana Mode)",
        text: "첨부 사진의 얼굴, 표정, 헤어, 포즈, 형태 엄격히 일관성을 유지하면서 다음의 명령을 수행, Ensure face, emotion, camera angle, pose strict consistency with the reference image[no change]. 화질개선, 옷질감 피부결, 눈썹, 머리결, 동공반사, 디테일업, 고화질 dslr, ai느낌이 아닌 실제 사람 사진",
        icon: "🍌",
    },
];

/// Finds a preset by key or label, ignoring case.
pub fn find_preset(name: &str) -> Option<&'static PresetPrompt> {
    let name = name.trim();
    PRESETS
        .iter()
        .find(|p| p.key.eq_ignore_ascii_case(name) || p.label.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_preset_by_key_and_label() {
        assert_eq!(find_preset("sketch-style").unwrap().label, "Sketch Style");
        assert_eq!(
            find_preset("  cyberpunk VIBE ").unwrap().key,
            "cyberpunk-vibe"
        );
        assert!(find_preset("watercolor").is_none());
    }

    #[test]
    fn test_presets_are_unique_and_non_blank() {
        for (i, preset) in PRESETS.iter().enumerate() {
            assert!(!preset.text.trim().is_empty(), "{} is blank", preset.key);
            assert!(
                PRESETS[i + 1..].iter().all(|p| p.key != preset.key),
                "duplicate key {}",
                preset.key
            );
        }
        assert_eq!(PRESETS.len(), 5);
    }
}
