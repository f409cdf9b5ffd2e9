mod tobacco;
